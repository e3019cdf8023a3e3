use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use crate::data::export::{
    project, render_export, summarize, ExportFile, ExportFormat, ExportSummary,
};
use crate::data::filter::{
    apply_constraints, distinct_values, ColumnChoices, Constraints, RefineSummary, Selection,
};
use crate::data::loader::load_report;
use crate::data::model::RecordTable;
use crate::data::predicate::eligible_rows;
use crate::rules::ReportRules;

// ---------------------------------------------------------------------------
// User-visible messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// Local wall-clock time; the report's dates carry no zone either.
pub fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// The uploaded file, as parsed.
pub struct LoadedReport {
    pub file_name: String,
    pub table: RecordTable,
}

/// Output of one pipeline run: predicate → refine → project → summary.
pub struct PipelineView {
    /// Rows passing the eligibility predicate.
    pub eligible: RecordTable,
    /// Selector options, one per constraint entry, same order.
    pub choices: Vec<ColumnChoices>,
    pub refined: RecordTable,
    pub refine_summary: RefineSummary,
    /// `None` when no display column is selected or projection failed.
    pub projected: Option<RecordTable>,
    pub summary: ExportSummary,
}

impl PipelineView {
    /// Message under the selectors while any of them is narrowing.
    pub fn refine_notice(&self) -> Option<Notice> {
        self.refine_summary
            .message()
            .map(|text| Notice::new(NoticeLevel::Info, text))
    }
}

/// Everything one user session holds, independent of rendering.
pub struct SessionState {
    pub rules: ReportRules,

    /// Loaded report (None until a file loads successfully).
    pub report: Option<LoadedReport>,

    pub constraints: Constraints,

    /// Display/export columns, in display order.
    pub selected_columns: Vec<String>,

    /// Result of the last upload attempt.
    pub load_notice: Option<Notice>,

    /// Messages produced by the last pipeline run.
    pub notices: Vec<Notice>,

    /// Result of the last download.
    pub export_notice: Option<Notice>,

    /// Last pipeline output (recomputed on every interaction).
    pub view: Option<PipelineView>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(ReportRules::default())
    }
}

impl SessionState {
    pub fn new(rules: ReportRules) -> Self {
        Self {
            constraints: Constraints::unconstrained(&rules),
            rules,
            report: None,
            selected_columns: Vec::new(),
            load_notice: None,
            notices: Vec::new(),
            export_notice: None,
            view: None,
        }
    }

    /// Replace the session's data with an uploaded file and rerun.
    ///
    /// On failure the previous report is discarded and the error is shown.
    pub fn load_bytes(&mut self, file_name: &str, bytes: Vec<u8>, now: NaiveDateTime) {
        self.export_notice = None;
        match load_report(bytes, &self.rules) {
            Ok(table) => {
                log::info!(
                    "Loaded `{file_name}`: {} records, columns {:?}",
                    table.len(),
                    table.column_names()
                );
                self.load_notice = Some(Notice::new(
                    NoticeLevel::Success,
                    format!("File loaded successfully! Found {} total records.", table.len()),
                ));
                self.constraints = Constraints::unconstrained(&self.rules);
                self.selected_columns = self
                    .rules
                    .default_columns
                    .iter()
                    .filter(|c| table.has_column(c))
                    .cloned()
                    .collect();
                self.report = Some(LoadedReport {
                    file_name: file_name.to_string(),
                    table,
                });
                self.rerun(now);
            }
            Err(e) => {
                let err = anyhow::Error::new(e).context(format!("loading `{file_name}`"));
                self.load_failed(err)
            }
        }
    }

    /// Record an upload that never reached the parser (e.g. unreadable path).
    pub fn load_failed(&mut self, err: anyhow::Error) {
        log::error!("Failed to load file: {err:#}");
        self.report = None;
        self.view = None;
        self.notices.clear();
        self.load_notice = Some(Notice::new(
            NoticeLevel::Error,
            format!("Error loading file: {err:#}"),
        ));
    }

    /// Re-run the whole pipeline over the loaded report.
    pub fn rerun(&mut self, now: NaiveDateTime) {
        self.notices.clear();
        self.view = None;
        let Some(report) = &self.report else {
            return;
        };
        let rules = &self.rules;

        let eligible = match eligible_rows(&report.table, rules, now) {
            Ok(outcome) => {
                for warning in outcome.warnings(rules) {
                    self.notices.push(Notice::new(NoticeLevel::Warning, warning));
                }
                outcome.table
            }
            Err(e) => {
                log::warn!("eligibility filter failed: {e}");
                self.notices.push(Notice::new(
                    NoticeLevel::Error,
                    format!("Error filtering data: {e}"),
                ));
                RecordTable::empty(report.table.columns().to_vec())
            }
        };

        if eligible.is_empty() {
            self.notices.push(Notice::new(
                NoticeLevel::Warning,
                "No Eligible Motorola Devices were found matching the criteria.",
            ));
        } else {
            self.notices.push(Notice::new(
                NoticeLevel::Success,
                format!("Found {} Motorola products!", eligible.len()),
            ));
        }

        let choices: Vec<ColumnChoices> = self
            .constraints
            .entries()
            .iter()
            .map(|c| distinct_values(&eligible, &c.column))
            .collect();
        self.constraints.retain_offered(&choices);

        let (refined, refine_summary) = apply_constraints(&eligible, &self.constraints);

        let projected = if self.selected_columns.is_empty() {
            None
        } else {
            match project(&refined, &self.selected_columns) {
                Ok(table) => Some(table),
                Err(e) => {
                    self.notices.push(Notice::new(NoticeLevel::Error, e.to_string()));
                    None
                }
            }
        };

        let summary = summarize(projected.as_ref().unwrap_or(&refined), &rules.date_column);
        log::debug!(
            "pipeline: {} loaded, {} eligible, {} refined",
            report.table.len(),
            eligible.len(),
            refined.len()
        );

        self.view = Some(PipelineView {
            eligible,
            choices,
            refined,
            refine_summary,
            projected,
            summary,
        });
    }

    /// Set one selector and rerun.
    pub fn select(&mut self, column: &str, selection: Selection, now: NaiveDateTime) {
        if self.constraints.select(column, selection) {
            self.rerun(now);
        }
    }

    /// Add or remove a display column and rerun. Added columns go last.
    pub fn toggle_column(&mut self, column: &str, now: NaiveDateTime) {
        if let Some(pos) = self.selected_columns.iter().position(|c| c == column) {
            self.selected_columns.remove(pos);
        } else {
            self.selected_columns.push(column.to_string());
        }
        self.rerun(now);
    }

    /// Every column the multi-select offers.
    pub fn available_columns(&self) -> Vec<String> {
        self.view
            .as_ref()
            .map(|v| v.eligible.column_names())
            .unwrap_or_default()
    }

    /// Serialise the current projected table, stamped with `at`.
    pub fn export(&self, format: ExportFormat, at: NaiveDateTime) -> Result<ExportFile> {
        let table = self
            .view
            .as_ref()
            .and_then(|v| v.projected.as_ref())
            .context("no columns selected for export")?;
        render_export(table, format, &self.rules, at)
            .with_context(|| format!("exporting {}", format.label()))
    }

    /// Show the outcome of a download.
    pub fn record_export(&mut self, result: Result<String>) {
        self.export_notice = Some(match result {
            Ok(saved) => Notice::new(NoticeLevel::Success, format!("Saved {saved}")),
            Err(e) => {
                log::error!("Export failed: {e:#}");
                Notice::new(NoticeLevel::Error, format!("Export failed: {e:#}"))
            }
        });
    }
}
