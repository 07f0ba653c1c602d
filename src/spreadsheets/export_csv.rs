use crate::cleaning::OutputTable;
use crate::errors::ServerError;
use csv::Writer;

/// Header row from `columns()`, then one record per row. Quoting is left to the writer.
pub fn table_to_csv(table: &OutputTable) -> Result<Vec<u8>, ServerError> {
    let mut wtr = Writer::from_writer(Vec::new());

    wtr.write_record(table.columns())
        .map_err(|e| ServerError::CsvError(format!("Failed to write header: {e}")))?;

    for (i, record) in table.records().enumerate() {
        wtr.write_record(record.iter().map(|cell| cell.to_string()))
            .map_err(|e| ServerError::CsvError(format!("Failed to write row {}: {e}", i + 1)))?;
    }

    wtr.into_inner()
        .map_err(|e| ServerError::CsvError(format!("Failed to flush: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaning::table::FIXED_COLUMNS;
    use crate::cleaning::{OutputRow, Tier};
    use serde_json::{json, Map};

    fn row(name: &str, extra: serde_json::Value) -> OutputRow {
        let extra: Map<String, serde_json::Value> = match extra {
            serde_json::Value::Object(map) => map,
            _ => Map::new(),
        };
        OutputRow {
            listing_name: name.to_string(),
            tier: Tier::PossiblyGood,
            reason: "total_months is Possibly Good Data: 2 (threshold: 2); \
                     missing_months is Good Data: 10"
                .to_string(),
            bedrooms: 2,
            total_reviews: 3,
            total_months: 2,
            missing_months: 10,
            avg_reviews_per_month: 1.5,
            high_season_reviews: 2,
            high_season: Some(1),
            high_season_insights: "2 Reviews in Q1".to_string(),
            number_of_guests: None,
            url: Some(json!("https://rentals.example/1")),
            name: Some(json!(name)),
            location: None,
            stars: Some(json!(4.5)),
            extra,
        }
    }

    #[test]
    fn header_then_rows_with_quoting() {
        let table = OutputTable::from_rows(vec![row(
            "Loft, \"Downtown\"",
            json!({"host": "Ann\nBob"}),
        )]);
        let text = String::from_utf8(table_to_csv(&table).unwrap()).unwrap();

        let mut lines = text.lines();
        let header = lines.next().unwrap();
        let expected_header = format!("{},host", FIXED_COLUMNS.join(","));
        assert_eq!(header, expected_header);

        assert!(text.contains("\"Loft, \"\"Downtown\"\"\",Possibly Good Data,"));
        // Reason contains "; " only, so it needs no quoting.
        assert!(text.contains(",2,3,2,10,1.5,2,1,2 Reviews in Q1,,https://rentals.example/1,"));
        assert!(text.contains(",4.5,\"Ann\nBob\"\n"));
    }

    #[test]
    fn empty_table_is_just_the_header() {
        let text = String::from_utf8(table_to_csv(&OutputTable::default()).unwrap()).unwrap();
        assert_eq!(text, format!("{}\n", FIXED_COLUMNS.join(",")));
    }
}
