use crate::cleaning::{CellValue, OutputTable};
use crate::errors::ServerError;
use rust_xlsxwriter::{Format, Workbook};

/// Longest string a single XLSX cell accepts.
const MAX_CELL_CHARS: usize = 32_767;

fn column(col: usize) -> Result<u16, ServerError> {
    u16::try_from(col)
        .map_err(|_| ServerError::XlsxError(format!("Too many columns for a worksheet: {}", col + 1)))
}

fn row(i: usize) -> Result<u32, ServerError> {
    u32::try_from(i + 1)
        .map_err(|_| ServerError::XlsxError(format!("Too many rows for a worksheet: {}", i + 1)))
}

pub fn table_to_xlsx(table: &OutputTable) -> Result<Vec<u8>, ServerError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();

    // Headers
    for (col, header) in table.columns().iter().enumerate() {
        worksheet
            .write_string_with_format(0, column(col)?, *header, &bold)
            .map_err(|e| {
                ServerError::XlsxError(format!("Failed to write header '{}': {}", header, e))
            })?;
    }

    // Rows
    for (i, record) in table.records().enumerate() {
        let r = row(i)?;

        for (col, cell) in record.iter().enumerate() {
            let c = column(col)?;
            let written = match cell {
                CellValue::Empty => continue,
                CellValue::Text(s) => worksheet.write_string(r, c, truncate_cell(s)),
                CellValue::Integer(n) => worksheet.write_number(r, c, *n as f64),
                CellValue::Float(x) => worksheet.write_number(r, c, *x),
            };
            written.map_err(|e| {
                ServerError::XlsxError(format!("Failed to write row {r}, column {c}: {e}"))
            })?;
        }
    }

    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e| ServerError::XlsxError(format!("Failed to freeze header: {}", e)))?;

    workbook
        .save_to_buffer()
        .map_err(|e| ServerError::XlsxError(format!("Failed to save workbook: {}", e)))
}

fn truncate_cell(s: &str) -> &str {
    match s.char_indices().nth(MAX_CELL_CHARS) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
