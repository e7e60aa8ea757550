use serde_json::Value;

use crate::domains::record::types::Record;

/// Leading characters that make spreadsheet apps evaluate a cell as a formula.
const FORMULA_PREFIXES: &[char] = &['=', '+', '-', '@'];

/// Strips characters spreadsheet apps mishandle inside cells and quotes
/// text that would otherwise be read as a formula.
pub fn sanitize_cell(s: &str) -> String {
    let cleaned = s
        .chars()
        .filter_map(|c| match c {
            '\u{2028}' | '\u{2029}' => None,
            '\u{00A0}' => Some(' '),
            c => Some(c),
        })
        .collect::<String>();
    let cleaned = cleaned.trim();

    if cleaned.starts_with(FORMULA_PREFIXES) {
        format!("'{}", cleaned)
    } else {
        cleaned.to_string()
    }
}

/// Renders an attribute value as a cell. Nested values are written as JSON.
pub fn csv_value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => sanitize_cell(s),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

pub fn csv_optional_uuid_to_string(value: &Option<uuid::Uuid>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

pub fn csv_datetime_to_string(dt: &chrono::DateTime<chrono::Utc>) -> String {
    dt.to_rfc3339()
}

/// Types that can be written as a row of a dynamic-column CSV.
pub trait CsvRecord {
    /// Column names this record contributes, in its own order.
    fn columns(&self) -> Vec<String>;

    fn cell(&self, column: &str) -> String;
}

impl CsvRecord for Record {
    fn columns(&self) -> Vec<String> {
        let mut columns = vec!["id".to_string(), "name".to_string()];
        columns.extend(self.attributes.keys().cloned());
        columns.push("createdAt".to_string());
        columns
    }

    fn cell(&self, column: &str) -> String {
        match column {
            "id" => self.id.to_string(),
            "name" => self.name.as_deref().map(sanitize_cell).unwrap_or_default(),
            "createdAt" => csv_datetime_to_string(&self.created_at),
            "createdById" => csv_optional_uuid_to_string(&self.created_by_user_id),
            other => self.get(other).map(csv_value_to_string).unwrap_or_default(),
        }
    }
}

impl<T: CsvRecord + ?Sized> CsvRecord for &T {
    fn columns(&self) -> Vec<String> {
        (**self).columns()
    }

    fn cell(&self, column: &str) -> String {
        (**self).cell(column)
    }
}

/// Header covering every record: `id`, `name`, attribute keys in first-seen
/// order, then `createdAt`.
pub fn header_for<T: CsvRecord>(records: &[T]) -> Vec<String> {
    let mut attributes: Vec<String> = Vec::new();
    for record in records {
        for column in record.columns() {
            if matches!(column.as_str(), "id" | "name" | "createdAt") {
                continue;
            }
            if !attributes.contains(&column) {
                attributes.push(column);
            }
        }
    }

    let mut header = vec!["id".to_string(), "name".to_string()];
    header.extend(attributes);
    header.push("createdAt".to_string());
    header
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn record(attributes: Value) -> Record {
        Record {
            id: Uuid::new_v4(),
            entity_type: "Contact".to_string(),
            name: Some("Ann\u{00A0}Lee ".to_string()),
            created_at: Utc::now(),
            created_by_user_id: None,
            attributes: attributes.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn header_keeps_first_seen_attribute_order() {
        let records = vec![
            record(json!({"city": "Lviv"})),
            record(json!({"phone": "1", "city": "Kyiv"})),
        ];
        let header = header_for(&records);
        // serde_json::Map iterates in key order within one record
        assert_eq!(header, vec!["id", "name", "city", "phone", "createdAt"]);
    }

    #[test]
    fn cells_render_values() {
        let r = record(json!({"age": 30, "vip": true, "tags": ["a"], "note": null}));
        assert_eq!(r.cell("name"), "Ann Lee");
        assert_eq!(r.cell("age"), "30");
        assert_eq!(r.cell("vip"), "true");
        assert_eq!(r.cell("tags"), "[\"a\"]");
        assert_eq!(r.cell("note"), "");
        assert_eq!(r.cell("missing"), "");
    }

    #[test]
    fn formula_like_text_is_quoted() {
        assert_eq!(sanitize_cell("=HYPERLINK(\"http://x\")"), "'=HYPERLINK(\"http://x\")");
        assert_eq!(sanitize_cell("  +1 555 0100"), "'+1 555 0100");
        assert_eq!(sanitize_cell("-2+3"), "'-2+3");
        assert_eq!(sanitize_cell("@SUM(A1)"), "'@SUM(A1)");
        assert_eq!(sanitize_cell("a=b"), "a=b");

        // numbers are values, not text
        let r = record(json!({"balance": -40, "formula": "=1+1"}));
        assert_eq!(r.cell("balance"), "-40");
        assert_eq!(r.cell("formula"), "'=1+1");
    }
}
