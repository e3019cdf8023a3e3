use chrono::{Duration, NaiveDateTime};

use super::error::FilterError;
use super::model::{CellValue, ColumnType, RecordTable};
use crate::rules::ReportRules;

// ---------------------------------------------------------------------------
// Fixed eligibility predicate
// ---------------------------------------------------------------------------

/// A clause column whose declared type can never satisfy its clause.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeMismatch {
    pub column: String,
    pub declared: ColumnType,
    pub expected: &'static str,
}

/// Result of running the eligibility predicate over a table.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    /// Eligible rows, in input order.
    pub table: RecordTable,
    /// Rows excluded because their date cell was empty or unparsable.
    pub unreadable_dates: usize,
    pub mistyped: Vec<TypeMismatch>,
}

impl FilterOutcome {
    /// Warnings to surface alongside the eligible rows.
    pub fn warnings(&self, rules: &ReportRules) -> Vec<String> {
        let mut out: Vec<String> = self
            .mistyped
            .iter()
            .map(|m| {
                format!(
                    "`{}` holds {} values but {} values are expected; no row can match",
                    m.column,
                    m.declared.label(),
                    m.expected
                )
            })
            .collect();
        if self.unreadable_dates > 0 {
            out.push(format!(
                "{} row(s) have no readable `{}` value and were excluded",
                self.unreadable_dates, rules.date_column
            ));
        }
        out
    }
}

/// Column positions of the four predicate clauses.
struct ClauseColumns {
    vendor: usize,
    cost: usize,
    product: usize,
    date: usize,
}

impl ClauseColumns {
    fn resolve(table: &RecordTable, rules: &ReportRules) -> Result<Self, FilterError> {
        let find = |name: &String| {
            table
                .column_index(name)
                .ok_or_else(|| FilterError::MissingColumn(name.clone()))
        };
        Ok(ClauseColumns {
            vendor: find(&rules.vendor_column)?,
            cost: find(&rules.cost_column)?,
            product: find(&rules.product_column)?,
            date: find(&rules.date_column)?,
        })
    }

    /// Check each clause column's declared type against what its clause reads.
    /// An all-null column is left alone; its rows simply fail.
    fn type_mismatches(&self, table: &RecordTable) -> Vec<TypeMismatch> {
        let text = CellValue::Text(String::new());
        let number = CellValue::Number(1.0);
        let date = CellValue::DateTime(NaiveDateTime::MIN);
        let checks: [(usize, &[&CellValue], &'static str); 4] = [
            (self.vendor, &[&text], "text"),
            (self.cost, &[&number], "number"),
            (self.product, &[&text], "text"),
            (self.date, &[&date, &text], "date"),
        ];

        checks
            .into_iter()
            .filter_map(|(index, wanted, expected)| {
                let column = &table.columns()[index];
                let fits = column.ty == ColumnType::Empty
                    || wanted.iter().any(|v| column.ty.admits(v));
                (!fits).then(|| TypeMismatch {
                    column: column.name.clone(),
                    declared: column.ty,
                    expected,
                })
            })
            .collect()
    }
}

/// Select the rows that are eligible Motorola submissions:
///
/// 1. vendor equals `rules.vendor` exactly
/// 2. cost is a number strictly greater than zero
/// 3. product name is text containing `rules.product_keyword` (case-sensitive)
/// 4. date created lies in `[now - window_days, now)`
///
/// Row order is preserved. Cells of the wrong kind fail their clause; a date
/// that cannot be read excludes the row and is counted in
/// [`FilterOutcome::unreadable_dates`]. Clause columns whose declared type
/// rules out every row are reported in [`FilterOutcome::mistyped`].
pub fn eligible_rows(
    table: &RecordTable,
    rules: &ReportRules,
    now: NaiveDateTime,
) -> Result<FilterOutcome, FilterError> {
    let cols = ClauseColumns::resolve(table, rules)?;
    let mistyped = cols.type_mismatches(table);
    for m in &mistyped {
        log::warn!("clause column `{}` is declared {:?}", m.column, m.declared);
    }
    let window_start = now - Duration::days(rules.window_days);
    let mut unreadable_dates = 0;

    let filtered = table.retain_rows(|row| {
        let vendor_ok = row[cols.vendor].as_text() == Some(rules.vendor.as_str());
        let cost_ok = row[cols.cost].as_f64().is_some_and(|cost| cost > 0.0);
        let product_ok = row[cols.product]
            .as_text()
            .is_some_and(|name| name.contains(rules.product_keyword.as_str()));
        if !(vendor_ok && cost_ok && product_ok) {
            return false;
        }
        match row[cols.date].as_datetime() {
            Some(created) => window_start <= created && created < now,
            None => {
                unreadable_dates += 1;
                false
            }
        }
    });

    if unreadable_dates > 0 {
        log::warn!("{unreadable_dates} candidate rows have an unreadable date");
    }
    log::debug!("eligibility predicate kept {} of {} rows", filtered.len(), table.len());

    Ok(FilterOutcome {
        table: filtered,
        unreadable_dates,
        mistyped,
    })
}
