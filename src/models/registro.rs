use chrono::NaiveDateTime;
use serde_json::{Map, Value};

/// Placeholder written for fields missing from the submission.
pub const SENTINEL: &str = "N/A";

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Column order of a record row. `timestamp` is filled by the server.
pub const COLUMNS: [&str; 16] = [
    "usuario_nombre",
    "timestamp",
    "estado_animo",
    "objetivo_mensual",
    "objetivo_semanal",
    "nivel_nutricion",
    "nivel_sueno",
    "nivel_energia",
    "semana",
    "dia",
    "ejercicio",
    "serie",
    "peso",
    "repeticiones",
    "rir",
    "rpe",
];

const TIMESTAMP_COLUMN: usize = 1;

/// One workout submission, ready to be written as a spreadsheet row.
#[derive(Debug)]
pub struct Registro {
    cells: [String; 16],
}

impl Registro {
    /// Map a submitted JSON object onto the fixed columns, stamping it with
    /// `recorded_at`. Any client-supplied `timestamp` is ignored.
    pub fn from_submission(fields: &Map<String, Value>, recorded_at: NaiveDateTime) -> Self {
        let cells = std::array::from_fn(|i| {
            if i == TIMESTAMP_COLUMN {
                recorded_at.format(TIMESTAMP_FORMAT).to_string()
            } else {
                fields
                    .get(COLUMNS[i])
                    .map(cell_text)
                    .unwrap_or_else(|| SENTINEL.to_string())
            }
        });
        Self { cells }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        COLUMNS
            .iter()
            .position(|c| *c == name)
            .map(|i| self.cells[i].as_str())
    }

    pub fn timestamp(&self) -> &str {
        &self.cells[TIMESTAMP_COLUMN]
    }

    pub fn into_row(self) -> Vec<String> {
        self.cells.into()
    }
}

/// Text written to the sheet for a submitted value.
///
/// Strings pass through untouched and `null` becomes an empty cell. Every
/// other value is re-serialized as compact JSON, so numbers are written as
/// parsed (`1e2` becomes `100.0`), not as the submitted text.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn recorded_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(7, 5, 9)
            .unwrap()
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_empty_submission_is_all_sentinels_but_timestamp() {
        let row = Registro::from_submission(&Map::new(), recorded_at()).into_row();

        assert_eq!(row.len(), 16);
        assert_eq!(row[1], "2025-03-14 07:05:09");
        for (i, cell) in row.iter().enumerate().filter(|(i, _)| *i != 1) {
            assert_eq!(cell, SENTINEL, "column {} should be the sentinel", COLUMNS[i]);
        }
    }

    #[test]
    fn test_partial_submission_keeps_column_order() {
        let fields = object(json!({
            "rpe": "8",
            "usuario_nombre": "Lucia",
            "ejercicio": "Sentadilla",
            "serie": "2",
        }));
        let row = Registro::from_submission(&fields, recorded_at()).into_row();

        assert_eq!(row[0], "Lucia");
        assert_eq!(row[10], "Sentadilla");
        assert_eq!(row[11], "2");
        assert_eq!(row[15], "8");
        assert_eq!(row[2], SENTINEL);
        assert_eq!(row[12], SENTINEL);
    }

    #[test]
    fn test_client_timestamp_is_ignored() {
        let fields = object(json!({ "timestamp": "1999-01-01 00:00:00" }));
        let registro = Registro::from_submission(&fields, recorded_at());
        assert_eq!(registro.timestamp(), "2025-03-14 07:05:09");
    }

    #[test]
    fn test_unknown_keys_are_dropped() {
        let fields = object(json!({ "ejercicios": [{ "nombre": "Press" }], "extra": 1 }));
        let row = Registro::from_submission(&fields, recorded_at()).into_row();
        assert_eq!(row.len(), 16);
        assert!(row.iter().all(|c| !c.contains("Press")));
    }

    #[test]
    fn test_cell_text_policy() {
        assert_eq!(cell_text(&json!("Bien")), "Bien");
        assert_eq!(cell_text(&json!(3)), "3");
        assert_eq!(cell_text(&json!(72.5)), "72.5");
        assert_eq!(cell_text(&json!(true)), "true");
        assert_eq!(cell_text(&Value::Null), "");
        assert_eq!(cell_text(&json!([1, 2])), "[1,2]");
        assert_eq!(cell_text(&json!({ "kg": 80 })), r#"{"kg":80}"#);
    }

    #[test]
    fn test_numbers_are_written_as_parsed() {
        let fields: Value = serde_json::from_str(
            r#"{"peso": 1e2, "repeticiones": 12345678901234567890123, "rir": -2}"#,
        )
        .unwrap();
        let registro = Registro::from_submission(fields.as_object().unwrap(), recorded_at());

        assert_eq!(registro.field("peso"), Some("100.0"));
        assert_eq!(registro.field("repeticiones"), Some("1.2345678901234568e22"));
        assert_eq!(registro.field("rir"), Some("-2"));
    }

    #[test]
    fn test_explicit_null_is_empty_not_sentinel() {
        let fields = object(json!({ "peso": null }));
        let registro = Registro::from_submission(&fields, recorded_at());
        assert_eq!(registro.field("peso"), Some(""));
        assert_eq!(registro.field("rir"), Some(SENTINEL));
        assert_eq!(registro.field("nope"), None);
    }
}
