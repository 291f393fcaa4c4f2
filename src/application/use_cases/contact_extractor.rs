// ============================================================
// CONTACT EXTRACTOR
// ============================================================
// Single-pass harvest of name/email/number/country tuples

use crate::domain::error::{AppError, Result};
use crate::domain::table::{ColumnRole, ColumnRoleMap, Contact, EngineConfig, RoleTable};
use crate::infrastructure::ingest::{decode_bytes, MemorySource, RowSource, WorkbookSource};

use super::header_resolver::{HeaderResolution, HeaderResolver};
use super::normalizer::normalize_field;

/// Harvests contact tuples from an arbitrary uploaded table. Shares the
/// resolver and normalizer with the filter engine but runs a single pass:
/// there is no dimension to enumerate, so no second read is needed.
pub struct ContactExtractor {
    config: EngineConfig,
    table: RoleTable,
}

impl ContactExtractor {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            table: RoleTable::contacts(),
        }
    }

    pub fn with_table(table: RoleTable) -> Self {
        Self {
            config: EngineConfig::default(),
            table,
        }
    }

    /// Read the whole source once and keep every row whose trimmed email
    /// cell is syntactically plausible (contains `@`), in original order.
    pub async fn extract(&self, source: &dyn RowSource) -> Result<Vec<Contact>> {
        let rows = source.open_rows().map_err(|e| AppError::Ingestion {
            rows_processed: 0,
            message: e.to_string(),
        })?;

        let resolver = HeaderResolver::new(self.table.clone());
        let mut roles: Option<ColumnRoleMap> = None;
        let mut scanned: u64 = 0;
        let mut contacts: Vec<Contact> = Vec::new();

        for item in rows {
            let row = item.map_err(|e| AppError::Ingestion {
                rows_processed: scanned,
                message: e.to_string(),
            })?;

            if roles.is_none() {
                match resolver.resolve(&row) {
                    HeaderResolution::Detected(map) => {
                        roles = Some(map);
                        continue;
                    }
                    // Headerless list: positional fallback, row is data.
                    HeaderResolution::NotFound => roles = Some(self.table.positional_map()),
                }
            }
            let map = match roles.as_ref() {
                Some(map) => map,
                None => continue,
            };

            scanned += 1;
            let email = map.cell(&row, ColumnRole::Email).trim();
            if !email.contains('@') {
                continue;
            }
            contacts.push(Contact {
                name: normalize_field(map.cell(&row, ColumnRole::Name)),
                email: email.to_string(),
                number: normalize_field(map.cell(&row, ColumnRole::Phone)),
                country: normalize_field(map.cell(&row, ColumnRole::Country)),
            });

            if scanned % self.config.progress_interval == 0 {
                tokio::task::yield_now().await;
            }
        }

        tracing::info!(rows = scanned, contacts = contacts.len(), "contact extraction complete");
        Ok(contacts)
    }

    /// Delimited-text upload: decode the bytes, detect the delimiter from
    /// the first line, and extract.
    pub async fn extract_delimited(&self, bytes: &[u8]) -> Result<Vec<Contact>> {
        let source = MemorySource::auto_detect(decode_bytes(bytes));
        self.extract(&source).await
    }

    /// Workbook upload: first sheet, same header/row contract.
    pub async fn extract_workbook(&self, path: impl Into<std::path::PathBuf>) -> Result<Vec<Contact>> {
        let source = WorkbookSource::new(path);
        self.extract(&source).await
    }
}

impl Default for ContactExtractor {
    fn default() -> Self {
        Self::new()
    }
}
