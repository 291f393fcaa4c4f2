pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use crate::application::use_cases::contact_extractor::ContactExtractor;
pub use crate::application::use_cases::filter_pipeline::SearchSession;
pub use crate::application::use_cases::header_resolver::{HeaderResolution, HeaderResolver};
pub use crate::application::use_cases::normalizer::{normalize_date, normalize_field};
pub use crate::domain::error::{AppError, Result};
pub use crate::domain::table::{
    CanonicalRecord, ColumnRole, ColumnRoleMap, Contact, DiscoveryOutcome, DiscoverySummary,
    EngineConfig, ExportArtifact, ExportOutcome, Preview, PreviewOutcome, RawRow, RoleTable,
    ScanProgress, SessionStage,
};
pub use crate::infrastructure::export::{export_records, EXPORT_COLUMNS};
pub use crate::infrastructure::ingest::{
    detect_delimiter, DelimitedSource, MemorySource, RowSource, WorkbookSource,
};
pub use crate::shared::cancel::CancelFlag;
