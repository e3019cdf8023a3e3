// ---------------------------------------------------------------------------
// Report rules: the fixed contract with the producing system
// ---------------------------------------------------------------------------

/// Business constants for the "eligible Motorola submission" report.
///
/// Nothing here is user-configurable; the struct exists so the pipeline
/// functions take their constants explicitly and tests can vary them.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRules {
    /// Sheet the sales-by-product export is read from.
    pub sheet_name: String,
    /// Zero-based row of the header within `sheet_name`.
    pub header_row: u32,

    pub vendor_column: String,
    pub cost_column: String,
    pub product_column: String,
    pub date_column: String,
    pub location_column: String,
    pub submitter_column: String,
    pub tracking_column: String,

    /// Exact value `vendor_column` must hold.
    pub vendor: String,
    /// Case-sensitive substring `product_column` must contain.
    pub product_keyword: String,
    /// Length of the rolling window ending at "now".
    pub window_days: i64,

    /// Columns selected for display/export when a file is first loaded.
    pub default_columns: Vec<String>,

    pub export_prefix: String,
    pub export_sheet_name: String,
    /// Extensions accepted by the upload dialog.
    pub upload_extensions: Vec<String>,
}

impl Default for ReportRules {
    fn default() -> Self {
        let date_column = "Date Created".to_string();
        let submitter_column = "Created By Username".to_string();
        let product_column = "Product Name".to_string();
        let tracking_column = "Tracking #".to_string();

        Self {
            sheet_name: "Report_Output".into(),
            header_row: 1,
            vendor_column: "Vendor Name".into(),
            cost_column: "AR Cost".into(),
            location_column: "Location Name".into(),
            default_columns: vec![
                date_column.clone(),
                submitter_column.clone(),
                product_column.clone(),
                tracking_column.clone(),
            ],
            date_column,
            submitter_column,
            product_column,
            tracking_column,
            vendor: "Ceva Logistics".into(),
            product_keyword: "Motorola".into(),
            window_days: 3,
            export_prefix: "motorola_products_filtered".into(),
            export_sheet_name: "Motorola_Products".into(),
            upload_extensions: vec!["xlsx".into(), "xls".into()],
        }
    }
}
