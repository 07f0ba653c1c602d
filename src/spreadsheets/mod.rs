pub mod export_csv;
pub mod export_xlsx;

pub use export_csv::table_to_csv;
pub use export_xlsx::table_to_xlsx;

use crate::cleaning::OutputTable;
use crate::errors::ServerError;

/// File format of a run's export, from `output_file_format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Excel,
}

impl ExportFormat {
    pub fn parse(value: &str) -> Result<ExportFormat, ServerError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            other => Err(ServerError::BadRequest(format!(
                "unsupported output format {other:?}, expected csv or excel"
            ))),
        }
    }

    /// Value stored with the run.
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "excel",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xlsx",
        }
    }

    /// Download name; a name that already carries the extension is kept as-is.
    pub fn file_name(self, base: &str) -> String {
        let base = base.trim();
        let base = if base.is_empty() { "cleaned_listings" } else { base };
        let suffix = format!(".{}", self.extension());
        if base.to_ascii_lowercase().ends_with(&suffix) {
            base.to_string()
        } else {
            format!("{base}{suffix}")
        }
    }
}

pub fn export_table(table: &OutputTable, format: ExportFormat) -> Result<Vec<u8>, ServerError> {
    match format {
        ExportFormat::Csv => table_to_csv(table),
        ExportFormat::Excel => table_to_xlsx(table),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_formats() {
        assert_eq!(ExportFormat::parse("csv").unwrap(), ExportFormat::Csv);
        assert_eq!(ExportFormat::parse(" Excel ").unwrap(), ExportFormat::Excel);
        assert_eq!(ExportFormat::parse("xlsx").unwrap(), ExportFormat::Excel);
        assert!(matches!(
            ExportFormat::parse("parquet"),
            Err(ServerError::BadRequest(_))
        ));
    }

    #[test]
    fn file_names() {
        assert_eq!(ExportFormat::Csv.file_name("cleaned"), "cleaned.csv");
        assert_eq!(ExportFormat::Excel.file_name("cleaned"), "cleaned.xlsx");
        assert_eq!(ExportFormat::Excel.file_name("report.XLSX"), "report.XLSX");
        assert_eq!(ExportFormat::Csv.file_name("  "), "cleaned_listings.csv");
    }
}
