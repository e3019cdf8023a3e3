use anyhow::Context;
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::{local_now, Notice, NoticeLevel, SessionState};

// ---------------------------------------------------------------------------
// Left side panel – upload, file info, display options, statistics
// ---------------------------------------------------------------------------

/// Render the left side panel.
pub fn side_panel(ui: &mut Ui, state: &mut SessionState) {
    ui.heading("File Upload");
    ui.label("Upload your Excel file to analyze Motorola products.");
    if ui
        .button("Choose an Excel file…")
        .on_hover_text("Upload the Sales_By_Product_Report.xlsx file")
        .clicked()
    {
        open_file_dialog(state);
    }

    let Some(report) = &state.report else {
        return;
    };

    ui.separator();
    ui.strong("File Information");
    ui.label(format!("Total Records: {}", report.table.len()));
    ui.label(format!("Columns: {}", report.table.columns().len()));
    ui.label(format!("File Name: {}", report.file_name));

    let Some(view) = &state.view else {
        return;
    };
    if view.eligible.is_empty() {
        return;
    }

    // ---- Column multi-select ----
    ui.separator();
    ui.strong("Display Options");
    ui.label("Select columns to display:");

    let mut toggled: Option<String> = None;
    ScrollArea::vertical()
        .id_salt("column_picker")
        .max_height(260.0)
        .show(ui, |ui: &mut Ui| {
            for col in state.available_columns() {
                let mut checked = state.selected_columns.contains(&col);
                if ui.checkbox(&mut checked, col.as_str()).changed() {
                    toggled = Some(col);
                }
            }
        });

    // ---- Summary statistics ----
    ui.separator();
    ui.strong("Summary Statistics");
    ui.label(format!("Total Filtered Records: {}", view.summary.rows));
    if let Some(range) = view.summary.date_range_label() {
        ui.label(format!("Date Range: {range}"));
    }

    if let Some(col) = toggled {
        state.toggle_column(&col, local_now());
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut SessionState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(report), Some(view)) = (&state.report, &state.view) {
            ui.label(format!(
                "{} records loaded, {} eligible, {} shown",
                report.table.len(),
                view.eligible.len(),
                view.refined.len()
            ));
        }
    });
}

/// Coloured one-line message.
pub fn notice(ui: &mut Ui, notice: &Notice) {
    let color = match notice.level {
        NoticeLevel::Info => Color32::LIGHT_BLUE,
        NoticeLevel::Success => Color32::from_rgb(80, 170, 80),
        NoticeLevel::Warning => Color32::from_rgb(220, 160, 30),
        NoticeLevel::Error => Color32::RED,
    };
    ui.label(RichText::new(&notice.text).color(color));
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut SessionState) {
    let file = rfd::FileDialog::new()
        .set_title("Open sales-by-product report")
        .add_filter("Excel files", state.rules.upload_extensions.as_slice())
        .pick_file();

    if let Some(path) = file {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match std::fs::read(&path).with_context(|| format!("reading {}", path.display())) {
            Ok(bytes) => state.load_bytes(&file_name, bytes, local_now()),
            Err(e) => state.load_failed(e),
        }
    }
}
