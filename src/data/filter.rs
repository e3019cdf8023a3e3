use std::collections::BTreeSet;
use std::fmt;

use super::model::{CellValue, RecordTable};
use crate::rules::ReportRules;

// ---------------------------------------------------------------------------
// Selection: one selector's state
// ---------------------------------------------------------------------------

/// Choice made in a single-value selector: the "All" sentinel or one value.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Selection {
    #[default]
    All,
    Only(CellValue),
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => write!(f, "All"),
            Selection::Only(value) => write!(f, "{value}"),
        }
    }
}

/// Options for one selector.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnChoices {
    pub column: String,
    /// False when the column is not in the table; the caller shows a note
    /// instead of a selector.
    pub available: bool,
    /// `Selection::All` first, then the distinct non-null values, sorted.
    pub options: Vec<Selection>,
}

/// Distinct non-null values of `column`, sorted, behind an "All" sentinel.
pub fn distinct_values(table: &RecordTable, column: &str) -> ColumnChoices {
    let Some(index) = table.column_index(column) else {
        return ColumnChoices {
            column: column.to_string(),
            available: false,
            options: vec![Selection::All],
        };
    };

    let distinct: BTreeSet<&CellValue> = table
        .column_values(index)
        .filter(|v| !v.is_null())
        .collect();

    let options = std::iter::once(Selection::All)
        .chain(distinct.into_iter().cloned().map(Selection::Only))
        .collect();

    ColumnChoices {
        column: column.to_string(),
        available: true,
        options,
    }
}

// ---------------------------------------------------------------------------
// Constraints: the three refinement selectors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Short name used in the summary line ("Location", "Salesman", ...).
    pub label: String,
    pub column: String,
    pub selection: Selection,
}

/// One selection per refinable column. All entries start at [`Selection::All`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    entries: Vec<Constraint>,
}

impl Constraints {
    /// Location, salesman and product selectors, all unconstrained.
    pub fn unconstrained(rules: &ReportRules) -> Self {
        let entry = |label: &str, column: &str| Constraint {
            label: label.to_string(),
            column: column.to_string(),
            selection: Selection::All,
        };
        Constraints {
            entries: vec![
                entry("Location", &rules.location_column),
                entry("Salesman", &rules.submitter_column),
                entry("Product", &rules.product_column),
            ],
        }
    }

    pub fn entries(&self) -> &[Constraint] {
        &self.entries
    }

    /// Current selection for `column`; unknown columns are unconstrained.
    #[cfg(test)]
    pub fn selection(&self, column: &str) -> &Selection {
        self.entries
            .iter()
            .find(|c| c.column == column)
            .map(|c| &c.selection)
            .unwrap_or(&Selection::All)
    }

    /// Replace the selection for `column`. Returns false if no selector
    /// exists for it.
    pub fn select(&mut self, column: &str, selection: Selection) -> bool {
        match self.entries.iter_mut().find(|c| c.column == column) {
            Some(entry) => {
                entry.selection = selection;
                true
            }
            None => false,
        }
    }

    /// Entries with a concrete value selected.
    pub fn active(&self) -> impl Iterator<Item = &Constraint> + '_ {
        self.entries
            .iter()
            .filter(|c| c.selection != Selection::All)
    }

    /// Reset every selection that is no longer among its selector's options.
    pub fn retain_offered(&mut self, choices: &[ColumnChoices]) {
        for entry in &mut self.entries {
            let offered = choices
                .iter()
                .find(|ch| ch.column == entry.column)
                .is_some_and(|ch| ch.options.contains(&entry.selection));
            if !offered && entry.selection != Selection::All {
                log::debug!("selection for `{}` no longer offered, reset", entry.column);
                entry.selection = Selection::All;
            }
        }
    }
}

/// What [`apply_constraints`] did, for display.
#[derive(Debug, Clone, PartialEq)]
pub struct RefineSummary {
    /// `(label, value)` of each active constraint, in selector order.
    pub active: Vec<(String, String)>,
    pub shown: usize,
    pub total: usize,
}

impl RefineSummary {
    /// Info line shown only when at least one constraint is active.
    pub fn message(&self) -> Option<String> {
        (!self.active.is_empty()).then(|| self.to_string())
    }
}

impl fmt::Display for RefineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.active.is_empty() {
            write!(f, "No filters applied")?;
        } else {
            let parts: Vec<String> = self
                .active
                .iter()
                .map(|(label, value)| format!("{label}: {value}"))
                .collect();
            write!(f, "Filters applied ({})", parts.join(", "))?;
        }
        write!(f, ": Showing {} of {} records", self.shown, self.total)
    }
}

/// Keep rows equal to every active constraint's value.
///
/// Equality is exact (no substring or case folding). A constraint on a
/// column the table lacks matches no row.
pub fn apply_constraints(
    table: &RecordTable,
    constraints: &Constraints,
) -> (RecordTable, RefineSummary) {
    let mut active = Vec::new();
    let mut checks: Vec<(Option<usize>, &CellValue)> = Vec::new();

    for c in constraints.active() {
        if let Selection::Only(value) = &c.selection {
            active.push((c.label.clone(), value.to_string()));
            checks.push((table.column_index(&c.column), value));
        }
    }

    let refined = if checks.is_empty() {
        table.clone()
    } else {
        table.retain_rows(|row| {
            checks
                .iter()
                .all(|(index, value)| index.is_some_and(|i| row[i] == **value))
        })
    };

    let summary = RefineSummary {
        active,
        shown: refined.len(),
        total: table.len(),
    };
    (refined, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn header() -> Vec<String> {
        ["Location Name", "Created By Username", "Product Name", "AR Cost"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn row(location: &str, user: &str, product: &str, cost: f64) -> Vec<CellValue> {
        let text = |s: &str| {
            if s.is_empty() {
                CellValue::Null
            } else {
                CellValue::from(s)
            }
        };
        vec![text(location), text(user), text(product), cost.into()]
    }

    fn sample() -> RecordTable {
        RecordTable::new(
            header(),
            vec![
                row("Store B", "jdoe", "Motorola Edge", 10.0),
                row("Store A", "asmith", "Motorola Razr", 20.0),
                row("", "jdoe", "Motorola Edge", 30.0),
                row("Store A", "jdoe", "Motorola G", 10.0),
            ],
        )
    }

    fn only(s: &str) -> Selection {
        Selection::Only(s.into())
    }

    #[test]
    fn distinct_values_are_sorted_without_nulls() {
        let choices = distinct_values(&sample(), "Location Name");
        assert!(choices.available);
        assert_eq!(
            choices.options,
            vec![Selection::All, only("Store A"), only("Store B")]
        );

        let costs = distinct_values(&sample(), "AR Cost");
        assert_eq!(
            costs.options,
            vec![
                Selection::All,
                Selection::Only(10.0.into()),
                Selection::Only(20.0.into()),
                Selection::Only(30.0.into())
            ]
        );
    }

    #[test]
    fn distinct_values_of_absent_column_is_just_the_sentinel() {
        let choices = distinct_values(&sample(), "Region");
        assert!(!choices.available);
        assert_eq!(choices.options, vec![Selection::All]);
    }

    #[test]
    fn constraints_compose_conjunctively() {
        let rules = ReportRules::default();
        let mut constraints = Constraints::unconstrained(&rules);
        assert!(constraints.select("Location Name", only("Store A")));
        assert!(constraints.select("Created By Username", only("jdoe")));

        let (refined, summary) = apply_constraints(&sample(), &constraints);
        assert_eq!(refined.rows(), &[row("Store A", "jdoe", "Motorola G", 10.0)]);
        assert_eq!(
            summary.message().as_deref(),
            Some("Filters applied (Location: Store A, Salesman: jdoe): Showing 1 of 4 records")
        );
    }

    #[test]
    fn product_constraint_is_exact_not_substring() {
        let mut constraints = Constraints::unconstrained(&ReportRules::default());
        constraints.select("Product Name", only("Motorola"));
        let (refined, summary) = apply_constraints(&sample(), &constraints);
        assert!(refined.is_empty());
        assert_eq!(summary.shown, 0);
        assert_eq!(summary.total, 4);
    }

    #[test]
    fn unknown_selector_is_rejected() {
        let mut constraints = Constraints::unconstrained(&ReportRules::default());
        assert!(!constraints.select("Tracking #", only("1Z")));
        assert_eq!(constraints.selection("Tracking #"), &Selection::All);
    }

    #[test]
    fn constraint_on_missing_column_matches_nothing() {
        let table = RecordTable::new(
            vec!["Product Name".into()],
            vec![vec!["Motorola Edge".into()]],
        );
        let mut constraints = Constraints::unconstrained(&ReportRules::default());
        constraints.select("Location Name", only("Store A"));
        let (refined, _) = apply_constraints(&table, &constraints);
        assert!(refined.is_empty());
    }

    #[test]
    fn stale_selection_resets_to_all() {
        let mut constraints = Constraints::unconstrained(&ReportRules::default());
        constraints.select("Location Name", only("Store Z"));
        constraints.select("Product Name", only("Motorola G"));

        let choices: Vec<ColumnChoices> = constraints
            .entries()
            .iter()
            .map(|c| distinct_values(&sample(), &c.column))
            .collect();
        constraints.retain_offered(&choices);

        assert_eq!(constraints.selection("Location Name"), &Selection::All);
        assert_eq!(constraints.selection("Product Name"), &only("Motorola G"));
    }

    #[test]
    fn summary_without_constraints_has_no_message() {
        let constraints = Constraints::unconstrained(&ReportRules::default());
        let (_, summary) = apply_constraints(&sample(), &constraints);
        assert_eq!(summary.message(), None);
        assert_eq!(summary.to_string(), "No filters applied: Showing 4 of 4 records");
    }

    fn arb_cell() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            Just("Store A".to_string()),
            Just("Store B".to_string()),
            "[a-z]{1,3}",
        ]
    }

    fn arb_table() -> impl Strategy<Value = RecordTable> {
        let rows = (arb_cell(), arb_cell(), arb_cell(), 0.0f64..50.0);
        prop::collection::vec(rows, 0..25).prop_map(|rows| {
            RecordTable::new(
                header(),
                rows.iter()
                    .map(|(l, u, p, c)| row(l, u, p, c.round()))
                    .collect(),
            )
        })
    }

    proptest! {
        #[test]
        fn unconstrained_is_identity(table in arb_table()) {
            let constraints = Constraints::unconstrained(&ReportRules::default());
            let (refined, summary) = apply_constraints(&table, &constraints);
            prop_assert_eq!(&refined, &table);
            prop_assert_eq!(summary.shown, table.len());
        }

        #[test]
        fn distinct_values_is_idempotent_and_null_free(table in arb_table(), col in 0usize..4) {
            let column = header()[col].clone();
            let first = distinct_values(&table, &column);
            let second = distinct_values(&table, &column);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(&first.options[0], &Selection::All);
            prop_assert!(!first.options.contains(&Selection::Only(CellValue::Null)));
            prop_assert_eq!(first.options.iter().filter(|o| **o == Selection::All).count(), 1);
        }

        #[test]
        fn every_refined_row_matches_its_constraint(table in arb_table(), pick in 0usize..8) {
            let choices = distinct_values(&table, "Location Name");
            let selection = choices.options[pick % choices.options.len()].clone();
            let mut constraints = Constraints::unconstrained(&ReportRules::default());
            constraints.select("Location Name", selection.clone());

            let (refined, _) = apply_constraints(&table, &constraints);
            if let Selection::Only(value) = selection {
                prop_assert!(refined.rows().iter().all(|r| r[0] == value));
                prop_assert!(!refined.is_empty());
            } else {
                prop_assert_eq!(refined.len(), table.len());
            }
        }
    }
}
