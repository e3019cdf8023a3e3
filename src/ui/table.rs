use anyhow::{Context, Result};
use eframe::egui::{self, Align, Layout, ScrollArea, TextStyle, Ui};
use egui_extras::{Column, TableBuilder};

use super::panels::notice;
use crate::data::export::ExportFormat;
use crate::data::filter::Selection;
use crate::data::model::RecordTable;
use crate::state::{local_now, SessionState};

// ---------------------------------------------------------------------------
// Central panel: messages, selectors, results, downloads
// ---------------------------------------------------------------------------

/// Render the central panel.
pub fn central_panel(ui: &mut Ui, state: &mut SessionState) {
    ui.heading("Moto Insiders Submissions");
    ui.separator();

    if let Some(n) = &state.load_notice {
        notice(ui, n);
    }
    if state.report.is_none() {
        instructions(ui);
        return;
    }
    for n in &state.notices {
        notice(ui, n);
    }

    let Some(view) = &state.view else {
        return;
    };
    if view.eligible.is_empty() {
        return;
    }

    // ---- Selectors ----
    ui.add_space(8.0);
    ui.strong("Filter Controls");

    let mut change: Option<(String, Selection)> = None;
    ui.columns(view.choices.len().max(1), |cols: &mut [Ui]| {
        let selectors = state.constraints.entries().iter().zip(&view.choices);
        for (ui, (constraint, choices)) in cols.iter_mut().zip(selectors) {
            if !choices.available {
                ui.label(format!("{} column not found in data", choices.column));
                continue;
            }
            ui.label(format!("Filter by {}:", constraint.label));
            let current = &constraint.selection;
            egui::ComboBox::from_id_salt(&choices.column)
                .selected_text(current.to_string())
                .show_ui(ui, |ui: &mut Ui| {
                    for option in &choices.options {
                        if ui
                            .selectable_label(option == current, option.to_string())
                            .clicked()
                            && option != current
                        {
                            change = Some((choices.column.clone(), option.clone()));
                        }
                    }
                });
        }
    });
    if let Some(n) = view.refine_notice() {
        notice(ui, &n);
    }

    // ---- Results ----
    ui.add_space(8.0);
    ui.strong("Motorola Submissions Table");

    let mut download: Option<ExportFormat> = None;
    match &view.projected {
        None => {
            ui.label("Select columns to display in the side panel.");
        }
        Some(table) => {
            results_table(ui, table);

            ui.add_space(8.0);
            ui.strong("Download Results");
            ui.horizontal(|ui: &mut Ui| {
                if ui.button("Download as CSV").clicked() {
                    download = Some(ExportFormat::Csv);
                }
                if ui.button("Download as Excel").clicked() {
                    download = Some(ExportFormat::Spreadsheet);
                }
            });
        }
    }
    if let Some(n) = &state.export_notice {
        notice(ui, n);
    }

    // Apply after rendering so the view is not mutated while borrowed.
    if let Some((column, selection)) = change {
        state.select(&column, selection, local_now());
    }
    if let Some(format) = download {
        save_export(state, format);
    }
}

fn results_table(ui: &mut Ui, table: &RecordTable) {
    let row_height = TextStyle::Body.resolve(ui.style()).size + 6.0;

    ScrollArea::horizontal()
        .id_salt("results_scroll")
        .show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .cell_layout(Layout::left_to_right(Align::Center))
                .columns(
                    Column::auto().at_least(90.0).clip(true),
                    table.columns().len(),
                )
                .min_scrolled_height(0.0)
                .max_scroll_height(420.0)
                .header(row_height, |mut header| {
                    for column in table.columns() {
                        header.col(|ui: &mut Ui| {
                            ui.strong(column.name.as_str());
                        });
                    }
                })
                .body(|body| {
                    body.rows(row_height, table.len(), |mut row| {
                        let cells = &table.rows()[row.index()];
                        for value in cells {
                            row.col(|ui: &mut Ui| {
                                ui.label(value.to_string());
                            });
                        }
                    });
                });
        });
}

fn instructions(ui: &mut Ui) {
    ui.label("Please upload an Excel file using the sidebar to get started.");
    ui.add_space(8.0);
    ui.strong("Instructions");
    for line in [
        "1. Upload File: use the file picker in the sidebar to open your Excel file",
        "2. Last 3 Days: only Ceva Logistics Motorola submissions from the last 3 days are kept",
        "3. Filter Results: narrow down by location, salesman, or product",
        "4. View Results: the table updates automatically based on your filters",
        "5. Customize Display: pick which columns to show in the sidebar",
        "6. Download: export your filtered results as CSV or Excel",
    ] {
        ui.label(line);
    }
}

// ---------------------------------------------------------------------------
// Save dialog
// ---------------------------------------------------------------------------

/// Render the export now (so the filename carries this moment) and write it
/// where the user chooses.
fn save_export(state: &mut SessionState, format: ExportFormat) {
    let saved = state
        .export(format, local_now())
        .and_then(|file| -> Result<Option<String>> {
            let Some(path) = rfd::FileDialog::new()
                .set_title("Save filtered submissions")
                .set_file_name(&file.file_name)
                .add_filter(file.format.label(), &[file.format.extension()])
                .save_file()
            else {
                return Ok(None);
            };
            std::fs::write(&path, &file.bytes)
                .with_context(|| format!("writing {}", path.display()))?;
            log::info!("saved {} ({}) to {}", file.file_name, file.format.mime(), path.display());
            Ok(Some(path.display().to_string()))
        });

    match saved {
        Ok(None) => {}
        Ok(Some(path)) => state.record_export(Ok(path)),
        Err(e) => state.record_export(Err(e)),
    }
}
