// ============================================================
// EXPORT SERIALIZER
// ============================================================
// Canonical records -> delimited text artifact with fixed column names

use crate::domain::error::{AppError, Result};
use crate::domain::table::{CanonicalRecord, ExportArtifact};

/// The fixed output contract. These names are independent of the internal
/// role names and must not change: downstream consumers key on them.
pub const EXPORT_COLUMNS: [&str; 13] = [
    "domainName",
    "createdDate",
    "expiresDate",
    "name",
    "registrant_name",
    "registrant_organization",
    "registrant_street1",
    "registrant_city",
    "registrant_state",
    "registrant_postalCode",
    "registrant_country",
    "email",
    "number",
];

pub const EXPORT_MIME: &str = "text/csv";

/// Serialize records into a downloadable artifact. Returns `Ok(None)` for an
/// empty record sequence: no file is produced in that case.
pub fn export_records(
    records: &[CanonicalRecord],
    selected_value: &str,
) -> Result<Option<ExportArtifact>> {
    if records.is_empty() {
        return Ok(None);
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(EXPORT_COLUMNS)
        .map_err(|e| AppError::ParseError(format!("Failed to write export header: {}", e)))?;

    for record in records {
        writer
            .write_record([
                record.domain_name.as_str(),
                record.created_date.as_str(),
                record.expires_date.as_str(),
                record.name.as_str(),
                record.registrant_name.as_str(),
                record.registrant_organization.as_str(),
                record.registrant_street1.as_str(),
                record.registrant_city.as_str(),
                record.registrant_state.as_str(),
                record.registrant_postal_code.as_str(),
                record.registrant_country.as_str(),
                record.email.as_str(),
                record.number.as_str(),
            ])
            .map_err(|e| AppError::ParseError(format!("Failed to write export row: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::ParseError(format!("Failed to flush export buffer: {}", e)))?;
    let content = String::from_utf8(bytes)
        .map_err(|e| AppError::ParseError(format!("Export produced invalid UTF-8: {}", e)))?;

    Ok(Some(ExportArtifact {
        filename: export_filename(selected_value),
        mime: EXPORT_MIME.to_string(),
        content,
    }))
}

/// Artifact name derived from the selected dimension value, with whitespace
/// replaced by underscores.
pub fn export_filename(value: &str) -> String {
    let slug: String = value
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("filtered_{}.csv", slug)
}
