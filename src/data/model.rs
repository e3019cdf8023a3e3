use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

// ---------------------------------------------------------------------------
// CellValue – a single cell of the report
// ---------------------------------------------------------------------------

/// A tagged spreadsheet cell.
/// Used as a `BTreeSet` key when collecting distinct values, so it must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
    Null,
}

/// Layouts tried, in order, when a text cell is read as a date/time.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Parse the textual date/time layouts the report producer is known to emit.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Number(_) => 1,
                Text(_) => 2,
                DateTime(_) => 3,
            }
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Number(a), Number(b)) if a == b => Ordering::Equal,
            (Number(a), Number(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            (DateTime(a), DateTime(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Text(s) => s.hash(state),
            // `-0.0 == 0.0`, so both must hash alike.
            CellValue::Number(n) => (n + 0.0).to_bits().hash(state),
            CellValue::DateTime(dt) => dt.hash(state),
            CellValue::Null => {}
        }
    }
}

/// Locale-independent text form, shared by the results table and the CSV export.
///
/// Whole numbers print without a fractional part, dates as ISO-8601, nulls as
/// the empty string.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Number(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
                write!(f, "{:.0}", v + 0.0)
            }
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            CellValue::Null => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::DateTime(dt)
    }
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Date/time view of the cell: native date cells directly, text cells
    /// through [`parse_datetime`]. Numbers are never treated as dates.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::DateTime(dt) => Some(*dt),
            CellValue::Text(s) => parse_datetime(s),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Column – header entry with the type declared at load time
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Every cell is null.
    Empty,
    Text,
    Number,
    DateTime,
    /// Non-null cells of more than one kind.
    Mixed,
}

impl ColumnType {
    fn of(value: &CellValue) -> Self {
        match value {
            CellValue::Text(_) => ColumnType::Text,
            CellValue::Number(_) => ColumnType::Number,
            CellValue::DateTime(_) => ColumnType::DateTime,
            CellValue::Null => ColumnType::Empty,
        }
    }

    /// Widen `self` so it also covers `value`.
    fn absorb(self, value: &CellValue) -> Self {
        match (self, ColumnType::of(value)) {
            (ty, ColumnType::Empty) => ty,
            (ColumnType::Empty, ty) => ty,
            (a, b) if a == b => a,
            _ => ColumnType::Mixed,
        }
    }

    /// Whether `value` conforms to this declared type.
    pub fn admits(self, value: &CellValue) -> bool {
        value.is_null() || self == ColumnType::Mixed || self == ColumnType::of(value)
    }

    pub fn label(self) -> &'static str {
        match self {
            ColumnType::Empty => "empty",
            ColumnType::Text => "text",
            ColumnType::Number => "number",
            ColumnType::DateTime => "date",
            ColumnType::Mixed => "mixed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
}

// ---------------------------------------------------------------------------
// RecordTable – the loaded report
// ---------------------------------------------------------------------------

/// An ordered sequence of rows sharing one header.
///
/// Rows are stored positionally; every row has exactly one cell per column.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTable {
    columns: Vec<Column>,
    rows: Vec<Vec<CellValue>>,
}

impl RecordTable {
    /// Build a table and declare each column's type from its cells.
    ///
    /// Rows shorter than the header are padded with nulls, longer rows are
    /// truncated.
    pub fn new(names: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = names.len();
        let rows: Vec<Vec<CellValue>> = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Null);
                row
            })
            .collect();

        let mut types = vec![ColumnType::Empty; width];
        for row in &rows {
            for (ty, value) in types.iter_mut().zip(row) {
                *ty = ty.absorb(value);
            }
        }

        let columns = names
            .into_iter()
            .zip(types)
            .map(|(name, ty)| Column { name, ty })
            .collect();

        RecordTable { columns, rows }
    }

    /// A table with `columns` and no rows.
    pub fn empty(columns: Vec<Column>) -> Self {
        RecordTable {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Cells of one column, top to bottom.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows.iter().map(move |row| &row[index])
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep the rows for which `keep` holds, in their original order.
    /// Column types are carried over unchanged.
    pub fn retain_rows<F>(&self, mut keep: F) -> RecordTable
    where
        F: FnMut(&[CellValue]) -> bool,
    {
        RecordTable {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Reorder/subset columns by index. Indices must be in range.
    pub(crate) fn select_columns(&self, indices: &[usize]) -> RecordTable {
        RecordTable {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn column_types_are_declared_from_cells() {
        let table = RecordTable::new(
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            vec![
                vec!["x".into(), 1.0.into(), CellValue::Null, "y".into()],
                vec!["z".into(), 2.0.into(), CellValue::Null, 3.0.into()],
            ],
        );
        let types: Vec<ColumnType> = table.columns().iter().map(|c| c.ty).collect();
        assert_eq!(
            types,
            vec![
                ColumnType::Text,
                ColumnType::Number,
                ColumnType::Empty,
                ColumnType::Mixed
            ]
        );
        assert!(ColumnType::Number.admits(&CellValue::Null));
        assert!(!ColumnType::Number.admits(&"x".into()));
    }

    #[test]
    fn short_rows_are_padded_to_header_width() {
        let table = RecordTable::new(
            vec!["a".into(), "b".into()],
            vec![vec!["only".into()], vec!["1".into(), "2".into(), "extra".into()]],
        );
        assert_eq!(table.rows()[0], vec!["only".into(), CellValue::Null]);
        assert_eq!(table.rows()[1].len(), 2);
    }

    #[test]
    fn display_is_locale_independent() {
        assert_eq!(CellValue::Number(1234567.0).to_string(), "1234567");
        assert_eq!(CellValue::Number(12.5).to_string(), "12.5");
        assert_eq!(
            CellValue::DateTime(dt("2024-03-05 07:08:09")).to_string(),
            "2024-03-05T07:08:09"
        );
        assert_eq!(CellValue::Null.to_string(), "");
    }

    #[test]
    fn text_dates_parse_in_known_layouts() {
        let expected = dt("2024-03-05 14:30:00");
        for text in [
            "2024-03-05 14:30:00",
            "2024-03-05T14:30:00",
            "2024-03-05 14:30:00.000",
            "03/05/2024 14:30:00",
            "03/05/2024 02:30:00 PM",
            " 2024-03-05 14:30 ",
        ] {
            assert_eq!(parse_datetime(text), Some(expected), "{text}");
        }
        assert_eq!(parse_datetime("2024-03-05"), Some(dt("2024-03-05 00:00:00")));
        assert_eq!(parse_datetime("not a date"), None);
        assert_eq!(parse_datetime(""), None);
        assert_eq!(CellValue::Number(45000.0).as_datetime(), None);
    }

    #[test]
    fn ordering_sorts_text_lexicographically_and_nulls_first() {
        let mut values = vec![
            CellValue::from("beta"),
            CellValue::Null,
            CellValue::from("Alpha"),
            CellValue::from("alpha"),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                CellValue::Null,
                "Alpha".into(),
                "alpha".into(),
                "beta".into()
            ]
        );
    }

    #[test]
    fn signed_zeros_are_one_value() {
        use std::collections::hash_map::DefaultHasher;
        use std::collections::BTreeSet;
        use std::hash::{Hash, Hasher};

        fn hash_of(v: &CellValue) -> u64 {
            let mut h = DefaultHasher::new();
            v.hash(&mut h);
            h.finish()
        }

        let pos = CellValue::Number(0.0);
        let neg = CellValue::Number(-0.0);
        assert_eq!(pos, neg);
        assert_eq!(pos.cmp(&neg), Ordering::Equal);
        assert_eq!(hash_of(&pos), hash_of(&neg));
        assert_eq!(neg.to_string(), "0");

        let distinct: BTreeSet<CellValue> =
            [pos, neg, CellValue::Number(-1.0)].into_iter().collect();
        assert_eq!(distinct.len(), 2);
    }
}
