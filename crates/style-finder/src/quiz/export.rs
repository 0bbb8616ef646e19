use super::repository::SubmissionRecord;

/// Header row of the admin CSV export.
pub const EXPORT_HEADERS: [&str; 10] = [
    "Submitted",
    "Name",
    "Email",
    "Primary Style",
    "Primary Score",
    "Secondary Style",
    "Secondary Score",
    "Supporting Style",
    "Supporting Score",
    "Email Status",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write csv export: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to finalize csv export: {0}")]
    Finalize(String),
}

/// Render submissions as CSV in the order given.
pub fn submissions_to_csv(records: &[SubmissionRecord]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADERS)?;

    for record in records {
        let view = record.summary_view();
        writer.write_record([
            view.submitted_at.to_rfc3339(),
            view.user_name,
            view.user_email,
            view.primary_style,
            view.primary_score.to_string(),
            view.secondary_style,
            view.secondary_score.to_string(),
            view.supporting_style,
            view.supporting_score.to_string(),
            view.email_status.to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Finalize(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| ExportError::Finalize(err.to_string()))
}
