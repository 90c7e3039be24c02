use std::fmt;

use derive_setters::Setters;

/// Stable identity of a row, assigned at seed time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowId(String);

impl RowId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RowId {
    fn from(s: &str) -> Self {
        RowId(s.to_string())
    }
}

impl From<String> for RowId {
    fn from(s: String) -> Self {
        RowId(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    /// Anything that is not a primitive. Rendered as-is and never editable.
    Opaque(String),
}

impl CellValue {
    pub fn is_editable(&self) -> bool {
        !matches!(self, CellValue::Opaque(_))
    }

    /// Builds the value that replaces `self` after an edit. Numbers stay numbers
    /// when the new text still parses as one.
    pub fn replaced_by(&self, input: &str) -> CellValue {
        match self {
            CellValue::Number(_) => input
                .trim()
                .parse::<f64>()
                .map(CellValue::Number)
                .unwrap_or_else(|_| CellValue::Text(input.to_string())),
            _ => CellValue::Text(input.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) | CellValue::Opaque(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<u32> for CellValue {
    fn from(n: u32) -> Self {
        CellValue::Number(n as f64)
    }
}

/// One addressable unit of tabular data. Field order is insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    id: RowId,
    fields: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new(id: impl Into<RowId>) -> Self {
        Self {
            id: id.into(),
            fields: Vec::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<CellValue>) -> Self {
        self.set(key, value.into());
        self
    }

    pub fn id(&self) -> &RowId {
        &self.id
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Display text of a field, empty when the row has no such field.
    pub fn text(&self, key: &str) -> String {
        self.get(key).map(|v| v.to_string()).unwrap_or_default()
    }

    pub fn set(&mut self, key: &str, value: CellValue) {
        match self.fields.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.fields.push((key.to_string(), value)),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Static schema entry describing how one field is rendered and edited.
#[derive(Debug, Clone, PartialEq, Setters)]
#[setters(strip_option)]
pub struct ColumnDescriptor {
    #[setters(skip)]
    pub key: String,
    #[setters(skip)]
    pub header: String,
    /// Share of the table width in percent. Columns without one split the rest.
    pub width: Option<u16>,
    pub editable: bool,
}

impl ColumnDescriptor {
    pub fn new(key: &str, header: &str) -> Self {
        Self {
            key: key.to_string(),
            header: header.to_string(),
            width: None,
            editable: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_overwrites_existing_field_in_place() {
        let mut row = Row::new("1").with("fileName", "A").with("status", "Pending");
        row.set("fileName", CellValue::from("B"));
        let keys: Vec<&str> = row.fields().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["fileName", "status"]);
        assert_eq!(row.text("fileName"), "B");
    }

    #[test]
    fn missing_field_renders_empty() {
        let row = Row::new("1");
        assert_eq!(row.text("nothing"), "");
        assert_eq!(row.id().as_str(), "1");
    }

    #[test]
    fn number_cells_keep_their_type_when_edited_with_a_number() {
        let cell = CellValue::Number(42.0);
        assert_eq!(cell.to_string(), "42");
        assert_eq!(cell.replaced_by("7"), CellValue::Number(7.0));
        assert_eq!(cell.replaced_by("seven"), CellValue::Text("seven".into()));
    }

    #[test]
    fn opaque_cells_are_not_editable() {
        assert!(!CellValue::Opaque("<chart>".into()).is_editable());
        assert!(CellValue::from("x").is_editable());
    }

    #[test]
    fn column_setters() {
        let col = ColumnDescriptor::new("fileName", "File name")
            .width(40)
            .editable(true);
        assert_eq!(col.width, Some(40));
        assert!(col.editable);
        assert_eq!(col.header, "File name");
    }
}
