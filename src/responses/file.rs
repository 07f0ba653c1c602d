// responses/file.rs
use crate::errors::ServerError;
use crate::responses::ResultResp;
use crate::spreadsheets::ExportFormat;
use astra::{Body, ResponseBuilder};

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Return XLSX file as HTTP response
pub fn xlsx_response(buffer: Vec<u8>, filename: &str) -> ResultResp {
    attachment(buffer, XLSX_CONTENT_TYPE, filename)
}

pub fn csv_response(buffer: Vec<u8>, filename: &str) -> ResultResp {
    attachment(buffer, mime::TEXT_CSV_UTF_8.as_ref(), filename)
}

pub fn export_response(buffer: Vec<u8>, format: ExportFormat, base_name: &str) -> ResultResp {
    let filename = format.file_name(base_name);
    match format {
        ExportFormat::Csv => csv_response(buffer, &filename),
        ExportFormat::Excel => xlsx_response(buffer, &filename),
    }
}

fn attachment(buffer: Vec<u8>, content_type: &str, filename: &str) -> ResultResp {
    // Quotes would end the header parameter early.
    let filename = filename.replace('"', "");

    ResponseBuilder::new()
        .status(200)
        .header("Content-Type", content_type)
        .header(
            "Content-Disposition",
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from(buffer))
        .map_err(|_| ServerError::InternalError) // Convert any builder error
}
