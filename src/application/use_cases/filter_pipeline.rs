// ============================================================
// TWO-PASS FILTER PIPELINE
// ============================================================
// Discovery pass (roles + distinct dimension values), then selection
// pass (matching rows -> canonical records), one session per file

use std::collections::HashSet;

use crate::domain::error::{AppError, Result};
use crate::domain::table::{
    CanonicalRecord, ColumnRole, ColumnRoleMap, DiscoveryOutcome, DiscoverySummary, EngineConfig,
    ExportOutcome, Preview, PreviewOutcome, RawRow, RoleTable, ScanProgress, SessionStage,
};
use crate::infrastructure::export::export_records;
use crate::infrastructure::ingest::RowSource;
use crate::shared::cancel::CancelFlag;

use super::header_resolver::{HeaderResolution, HeaderResolver};
use super::normalizer::{normalize_date, normalize_field};

/// One filtering session over one uploaded file. Attaching a new file
/// discards every piece of derived state; nothing leaks between files.
pub struct SearchSession {
    config: EngineConfig,
    table: RoleTable,
    target: ColumnRole,
    source: Option<Box<dyn RowSource>>,
    stage: SessionStage,
    roles: Option<ColumnRoleMap>,
    header_detected: bool,
    values: Vec<String>,
    selected: Option<String>,
    rows_scanned: u64,
}

enum DiscoveryScan {
    Cancelled,
    Done {
        roles: ColumnRoleMap,
        header_detected: bool,
        values: Vec<String>,
        rows_scanned: u64,
        rows_skipped: u64,
    },
}

enum SelectionScan {
    Cancelled,
    Done {
        matches: Vec<CanonicalRecord>,
        rows_scanned: u64,
    },
}

impl SearchSession {
    pub fn new() -> Result<Self> {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Result<Self> {
        Self::with_role_table(config, RoleTable::filter())
    }

    /// Run the pipeline over a custom role table. The table must declare a
    /// target dimension; without one there is nothing to discover.
    pub fn with_role_table(config: EngineConfig, table: RoleTable) -> Result<Self> {
        config.validate().map_err(AppError::ValidationError)?;
        let target = table.target().ok_or_else(|| {
            AppError::ValidationError("role table must declare a target dimension".to_string())
        })?;
        Ok(Self {
            config,
            table,
            target,
            source: None,
            stage: SessionStage::Upload,
            roles: None,
            header_detected: false,
            values: Vec::new(),
            selected: None,
            rows_scanned: 0,
        })
    }

    pub fn stage(&self) -> SessionStage {
        self.stage
    }

    /// Distinct target values discovered by Pass 1, sorted for presentation.
    pub fn distinct_values(&self) -> &[String] {
        &self.values
    }

    pub fn selected_value(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn rows_scanned(&self) -> u64 {
        self.rows_scanned
    }

    /// Attach an uploaded file. Fully resets the role map, distinct values,
    /// selection, and counters before the next discovery begins.
    pub fn attach(&mut self, source: Box<dyn RowSource>) {
        self.reset_derived();
        self.source = Some(source);
        self.stage = SessionStage::Upload;
    }

    /// "Choose another file": the only backward edge out of Configuring.
    pub fn choose_another_file(&mut self) -> Result<()> {
        if self.stage != SessionStage::Configuring {
            return Err(AppError::StateError(
                "choose-another-file is only available while configuring".to_string(),
            ));
        }
        self.source = None;
        self.reset_derived();
        self.stage = SessionStage::Upload;
        Ok(())
    }

    /// "Back to filter": the backward edge out of Previewing.
    pub fn back_to_filter(&mut self) -> Result<()> {
        if self.stage != SessionStage::Previewing {
            return Err(AppError::StateError(
                "back-to-filter is only available from a preview".to_string(),
            ));
        }
        self.stage = SessionStage::Configuring;
        Ok(())
    }

    /// Pass 1: stream the whole file once, resolve header roles on the
    /// first row, and enumerate distinct values of the target dimension.
    /// Progress is reported (and control yielded) every
    /// `progress_interval` rows. On failure or cancellation the session
    /// returns to Upload with no residual state.
    pub async fn discover(
        &mut self,
        mut progress: impl FnMut(ScanProgress),
        cancel: &CancelFlag,
    ) -> Result<DiscoveryOutcome> {
        if self.stage != SessionStage::Upload {
            return Err(AppError::StateError(
                "discovery requires a freshly attached file".to_string(),
            ));
        }
        if self.source.is_none() {
            return Err(AppError::StateError("no file attached".to_string()));
        }

        self.reset_derived();
        self.stage = SessionStage::Discovering;

        match self.run_discovery(&mut progress, cancel).await {
            Err(e) => {
                tracing::warn!(error = %e, "discovery pass aborted");
                self.reset_derived();
                self.stage = SessionStage::Upload;
                Err(e)
            }
            Ok(DiscoveryScan::Cancelled) => {
                self.reset_derived();
                self.stage = SessionStage::Upload;
                Ok(DiscoveryOutcome::Cancelled)
            }
            Ok(DiscoveryScan::Done {
                roles,
                header_detected,
                values,
                rows_scanned,
                rows_skipped,
            }) => {
                self.rows_scanned = rows_scanned;
                if values.is_empty() {
                    // Informational, not an error: the caller prompts the
                    // user to check the file's formatting.
                    self.stage = SessionStage::Upload;
                    return Ok(DiscoveryOutcome::Empty { rows_scanned });
                }
                tracing::info!(
                    rows = rows_scanned,
                    skipped = rows_skipped,
                    values = values.len(),
                    header_detected,
                    "discovery pass complete"
                );
                self.roles = Some(roles);
                self.header_detected = header_detected;
                self.values = values.clone();
                self.stage = SessionStage::Configuring;
                Ok(DiscoveryOutcome::Values(DiscoverySummary {
                    rows_scanned,
                    rows_skipped,
                    header_detected,
                    values,
                }))
            }
        }
    }

    /// Pick the target value for Pass 2. Pure state, no I/O.
    pub fn select_value(&mut self, value: &str) -> Result<()> {
        if self.stage != SessionStage::Configuring {
            return Err(AppError::StateError(
                "a value can only be selected while configuring".to_string(),
            ));
        }
        self.selected = Some(value.to_string());
        Ok(())
    }

    /// Pass 2, preview form: re-stream from byte 0 with the frozen role
    /// map and return the first `preview_limit` matches plus the true
    /// total. Failure or cancellation returns the session to Configuring,
    /// so a retry needs no re-upload.
    pub async fn preview(
        &mut self,
        mut progress: impl FnMut(ScanProgress),
        cancel: &CancelFlag,
    ) -> Result<PreviewOutcome> {
        self.require_selection()?;
        self.stage = SessionStage::Previewing;

        match self.run_selection(&mut progress, cancel).await {
            Err(e) => {
                tracing::warn!(error = %e, "selection pass aborted");
                self.stage = SessionStage::Configuring;
                Err(e)
            }
            Ok(SelectionScan::Cancelled) => {
                self.stage = SessionStage::Configuring;
                Ok(PreviewOutcome::Cancelled)
            }
            Ok(SelectionScan::Done { matches, .. }) => {
                if matches.is_empty() {
                    self.stage = SessionStage::Configuring;
                    return Ok(PreviewOutcome::Empty);
                }
                let total = matches.len();
                let records: Vec<CanonicalRecord> = matches
                    .into_iter()
                    .take(self.config.preview_limit)
                    .collect();
                Ok(PreviewOutcome::Preview(Preview { records, total }))
            }
        }
    }

    /// Pass 2, export form: hand the full match sequence to the serializer.
    /// The session returns to Configuring afterwards and stays usable.
    pub async fn export(
        &mut self,
        mut progress: impl FnMut(ScanProgress),
        cancel: &CancelFlag,
    ) -> Result<ExportOutcome> {
        let selected = self.require_selection()?;
        self.stage = SessionStage::Exporting;

        match self.run_selection(&mut progress, cancel).await {
            Err(e) => {
                tracing::warn!(error = %e, "selection pass aborted");
                self.stage = SessionStage::Configuring;
                Err(e)
            }
            Ok(SelectionScan::Cancelled) => {
                self.stage = SessionStage::Configuring;
                Ok(ExportOutcome::Cancelled)
            }
            Ok(SelectionScan::Done {
                matches,
                rows_scanned,
            }) => {
                tracing::info!(
                    rows = rows_scanned,
                    matches = matches.len(),
                    value = %selected,
                    "selection pass complete"
                );
                let artifact = export_records(&matches, &selected)?;
                self.stage = SessionStage::Configuring;
                match artifact {
                    Some(artifact) => Ok(ExportOutcome::Artifact(artifact)),
                    None => Ok(ExportOutcome::Empty),
                }
            }
        }
    }

    fn require_selection(&self) -> Result<String> {
        if self.stage != SessionStage::Configuring {
            return Err(AppError::StateError(
                "the selection pass requires the configuring stage".to_string(),
            ));
        }
        self.selected
            .clone()
            .ok_or_else(|| AppError::StateError("no target value selected".to_string()))
    }

    fn reset_derived(&mut self) {
        self.roles = None;
        self.header_detected = false;
        self.values.clear();
        self.selected = None;
        self.rows_scanned = 0;
    }

    async fn run_discovery(
        &self,
        progress: &mut dyn FnMut(ScanProgress),
        cancel: &CancelFlag,
    ) -> Result<DiscoveryScan> {
        let source = self
            .source
            .as_deref()
            .ok_or_else(|| AppError::StateError("no file attached".to_string()))?;
        let rows = source.open_rows().map_err(|e| AppError::Ingestion {
            rows_processed: 0,
            message: e.to_string(),
        })?;

        let resolver = HeaderResolver::new(self.table.clone());
        let mut roles: Option<ColumnRoleMap> = None;
        let mut header_detected = false;
        let mut distinct: HashSet<String> = HashSet::new();
        let mut scanned: u64 = 0;
        let mut skipped: u64 = 0;

        for item in rows {
            if cancel.is_cancelled() {
                return Ok(DiscoveryScan::Cancelled);
            }
            let row = item.map_err(|e| AppError::Ingestion {
                rows_processed: scanned,
                message: e.to_string(),
            })?;

            if roles.is_none() {
                match resolver.resolve(&row) {
                    HeaderResolution::Detected(map) => {
                        tracing::debug!(?map, "header roles resolved");
                        header_detected = true;
                        roles = Some(map);
                        continue;
                    }
                    // Headerless export: fall back to the positional schema
                    // and count this row as data.
                    HeaderResolution::NotFound => roles = Some(self.table.positional_map()),
                }
            }
            let map = match roles.as_ref() {
                Some(map) => map,
                None => continue,
            };

            scanned += 1;
            if row.len() < self.config.min_plausible_columns {
                skipped += 1;
            } else {
                let value = map.cell(&row, self.target).trim();
                if self.accept_value(value) {
                    distinct.insert(value.to_string());
                }
            }

            if scanned % self.config.progress_interval == 0 {
                progress(ScanProgress {
                    rows_scanned: scanned,
                    distinct_values: distinct.len(),
                });
                tokio::task::yield_now().await;
            }
        }

        let mut values: Vec<String> = distinct.into_iter().collect();
        values.sort();

        Ok(DiscoveryScan::Done {
            roles: roles.unwrap_or_else(|| self.table.positional_map()),
            header_detected,
            values,
            rows_scanned: scanned,
            rows_skipped: skipped,
        })
    }

    /// Guards on a candidate dimension value: non-empty, plausible length,
    /// and not a leaked header token for the target role.
    fn accept_value(&self, value: &str) -> bool {
        if value.is_empty() || value.chars().count() > self.config.max_value_length {
            return false;
        }
        !self
            .table
            .candidates(self.target)
            .iter()
            .any(|candidate| value.eq_ignore_ascii_case(candidate))
    }

    async fn run_selection(
        &self,
        progress: &mut dyn FnMut(ScanProgress),
        cancel: &CancelFlag,
    ) -> Result<SelectionScan> {
        let source = self
            .source
            .as_deref()
            .ok_or_else(|| AppError::StateError("no file attached".to_string()))?;
        let map = self
            .roles
            .as_ref()
            .ok_or_else(|| AppError::StateError("no resolved role map".to_string()))?;
        let selected = self
            .selected
            .as_deref()
            .ok_or_else(|| AppError::StateError("no target value selected".to_string()))?;
        let rows = source.open_rows().map_err(|e| AppError::Ingestion {
            rows_processed: 0,
            message: e.to_string(),
        })?;

        let mut first = true;
        let mut scanned: u64 = 0;
        let mut matches: Vec<CanonicalRecord> = Vec::new();

        for item in rows {
            if cancel.is_cancelled() {
                return Ok(SelectionScan::Cancelled);
            }
            let row = item.map_err(|e| AppError::Ingestion {
                rows_processed: scanned,
                message: e.to_string(),
            })?;

            if first {
                first = false;
                if self.header_detected {
                    continue;
                }
            }

            scanned += 1;
            // Exact, case-sensitive comparison after trimming. Deliberate:
            // the discovery set shows raw values verbatim, and the match
            // predicate mirrors them literally.
            if map.cell(&row, self.target).trim() == selected {
                matches.push(build_record(&row, map));
            }

            if scanned % self.config.progress_interval == 0 {
                progress(ScanProgress {
                    rows_scanned: scanned,
                    distinct_values: matches.len(),
                });
                tokio::task::yield_now().await;
            }
        }

        Ok(SelectionScan::Done {
            matches,
            rows_scanned: scanned,
        })
    }
}

/// Map a matching row into the fixed-shape output record. The role-to-field
/// reassignment (`name` <- registrar, `registrant_name` <- company,
/// `registrant_organization` <- name) is part of the export contract.
fn build_record(row: &RawRow, roles: &ColumnRoleMap) -> CanonicalRecord {
    CanonicalRecord {
        domain_name: normalize_field(roles.cell(row, ColumnRole::Domain)),
        created_date: normalize_date(roles.cell(row, ColumnRole::CreateDate).trim()),
        expires_date: normalize_date(roles.cell(row, ColumnRole::ExpiryDate).trim()),
        name: normalize_field(roles.cell(row, ColumnRole::Registrar)),
        registrant_name: normalize_field(roles.cell(row, ColumnRole::Company)),
        registrant_organization: normalize_field(roles.cell(row, ColumnRole::Name)),
        registrant_street1: normalize_field(roles.cell(row, ColumnRole::Address)),
        registrant_city: normalize_field(roles.cell(row, ColumnRole::City)),
        registrant_state: normalize_field(roles.cell(row, ColumnRole::State)),
        registrant_postal_code: normalize_field(roles.cell(row, ColumnRole::Zip)),
        registrant_country: normalize_field(roles.cell(row, ColumnRole::Country)),
        email: normalize_field(roles.cell(row, ColumnRole::Email)),
        number: normalize_field(roles.cell(row, ColumnRole::Phone)),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::infrastructure::ingest::{DelimitedSource, MemorySource};

    /// Delivers `fail_after_items` rows on the `fail_on_open`-th read and
    /// then errors mid-stream; every other read succeeds in full.
    struct FaultySource {
        content: String,
        fail_on_open: usize,
        fail_after_items: usize,
        opens: AtomicUsize,
    }

    impl FaultySource {
        fn new(content: String, fail_on_open: usize, fail_after_items: usize) -> Self {
            Self {
                content,
                fail_on_open,
                fail_after_items,
                opens: AtomicUsize::new(0),
            }
        }
    }

    impl RowSource for FaultySource {
        fn open_rows(&self) -> Result<Box<dyn Iterator<Item = Result<RawRow>> + Send + '_>> {
            let open = self.opens.fetch_add(1, Ordering::SeqCst) + 1;
            let inner = MemorySource::new(self.content.clone(), b',');
            let mut items: Vec<Result<RawRow>> = inner.open_rows()?.collect();
            if open == self.fail_on_open {
                items.truncate(self.fail_after_items);
                items.push(Err(AppError::ParseError(
                    "unreadable byte sequence".to_string(),
                )));
            }
            Ok(Box::new(items.into_iter()))
        }
    }

    const HEADER: &str = "domainName,createdDate,expiresDate,registrarName,\
                          registrant_organization,registrant_name,registrant_street1,\
                          registrant_city,registrant_state,registrant_postalCode,\
                          registrant_country,registrant_email,registrant_phone";

    fn data_row(i: usize, country: &str) -> String {
        format!(
            "site{i}.com,2020-01-15,46026,Registrar Inc,Org {i},Person {i},\
             1 Main St,Springfield,SP,12345,{country},person{i}@site{i}.com,+1 555 000{i}"
        )
    }

    fn synthetic_file() -> String {
        let mut lines = vec![HEADER.to_string()];
        for i in 0..1000 {
            let country = if i < 37 {
                "Brazil"
            } else if i % 3 == 0 {
                "Chile"
            } else if i % 3 == 1 {
                "Peru"
            } else {
                "Argentina"
            };
            lines.push(data_row(i, country));
        }
        lines.join("\n")
    }

    fn session_over(content: &str) -> SearchSession {
        let mut session = SearchSession::new().unwrap();
        session.attach(Box::new(MemorySource::new(content.to_string(), b',')));
        session
    }

    async fn discover(session: &mut SearchSession) -> DiscoveryOutcome {
        session
            .discover(|_| {}, &CancelFlag::new())
            .await
            .unwrap()
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();
    }

    #[tokio::test]
    async fn brazil_filter_yields_exactly_37_records() {
        init_tracing();
        let content = synthetic_file();
        let mut session = session_over(&content);

        match discover(&mut session).await {
            DiscoveryOutcome::Values(summary) => {
                assert_eq!(summary.values, vec!["Argentina", "Brazil", "Chile", "Peru"]);
                assert!(summary.header_detected);
                assert_eq!(summary.rows_scanned, 1000);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(session.stage(), SessionStage::Configuring);

        session.select_value("Brazil").unwrap();
        match session.export(|_| {}, &CancelFlag::new()).await.unwrap() {
            ExportOutcome::Artifact(artifact) => {
                assert_eq!(artifact.filename, "filtered_Brazil.csv");
                assert_eq!(artifact.content.lines().count(), 38);
                // Quirk check: output `name` column carries the registrar.
                let first_data = artifact.content.lines().nth(1).unwrap();
                assert!(first_data.contains("Registrar Inc"));
                assert!(first_data.starts_with("site0.com,"));
                // Serial expiry renders canonically.
                assert!(first_data.contains("2026-01-04T00:00:00Z"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(session.stage(), SessionStage::Configuring);
    }

    #[tokio::test]
    async fn preview_caps_records_and_reports_true_total() {
        let content = synthetic_file();
        let mut session = session_over(&content);
        discover(&mut session).await;
        session.select_value("Chile").unwrap();

        match session.preview(|_| {}, &CancelFlag::new()).await.unwrap() {
            PreviewOutcome::Preview(preview) => {
                assert_eq!(preview.records.len(), 50);
                assert!(preview.total > 50);
                assert_eq!(preview.records[0].registrant_country, "Chile");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(session.stage(), SessionStage::Previewing);
        session.back_to_filter().unwrap();
        assert_eq!(session.stage(), SessionStage::Configuring);
    }

    #[tokio::test]
    async fn rescan_is_idempotent() {
        let content = synthetic_file();
        let mut session = session_over(&content);
        let first = match discover(&mut session).await {
            DiscoveryOutcome::Values(summary) => summary.values,
            other => panic!("unexpected outcome: {:?}", other),
        };

        session.attach(Box::new(MemorySource::new(content.clone(), b',')));
        let second = match discover(&mut session).await {
            DiscoveryOutcome::Values(summary) => summary.values,
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn length_and_self_header_guards_apply() {
        let long_value = "x".repeat(70);
        let content = format!(
            "{HEADER}\n{}\n{}\n{}",
            data_row(0, &long_value),
            data_row(1, "registrant_country"),
            data_row(2, "Brazil"),
        );
        let mut session = session_over(&content);
        match discover(&mut session).await {
            DiscoveryOutcome::Values(summary) => {
                assert_eq!(summary.values, vec!["Brazil"]);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn zero_values_is_an_empty_outcome_not_an_error() {
        let content = format!("{HEADER}\n{}\n{}", data_row(0, ""), data_row(1, " "));
        let mut session = session_over(&content);
        match discover(&mut session).await {
            DiscoveryOutcome::Empty { rows_scanned } => assert_eq!(rows_scanned, 2),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(session.stage(), SessionStage::Upload);
    }

    #[tokio::test]
    async fn malformed_short_rows_are_skipped_silently() {
        let content = format!("{HEADER}\n{}\nonly,four,cells,here\n{}", data_row(0, "Brazil"), data_row(1, "Peru"));
        let mut session = session_over(&content);
        match discover(&mut session).await {
            DiscoveryOutcome::Values(summary) => {
                assert_eq!(summary.values, vec!["Brazil", "Peru"]);
                assert_eq!(summary.rows_skipped, 1);
                assert_eq!(summary.rows_scanned, 3);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn new_upload_discards_previous_session_state() {
        let file_a = format!("{HEADER}\n{}", data_row(0, "Brazil"));
        let file_b = format!("{HEADER}\n{}", data_row(0, "Japan"));
        let mut session = session_over(&file_a);
        discover(&mut session).await;
        assert_eq!(session.distinct_values().to_vec(), vec!["Brazil"]);

        session.attach(Box::new(MemorySource::new(file_b, b',')));
        // Before B's discovery completes, none of A's values are visible.
        assert!(session.distinct_values().is_empty());
        assert_eq!(session.rows_scanned(), 0);

        match discover(&mut session).await {
            DiscoveryOutcome::Values(summary) => assert_eq!(summary.values, vec!["Japan"]),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn match_predicate_is_case_sensitive() {
        let content = format!("{HEADER}\n{}", data_row(0, "brazil"));
        let mut session = session_over(&content);
        discover(&mut session).await;
        session.select_value("Brazil").unwrap();
        match session.preview(|_| {}, &CancelFlag::new()).await.unwrap() {
            PreviewOutcome::Empty => {}
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(session.stage(), SessionStage::Configuring);
    }

    #[tokio::test]
    async fn headerless_file_uses_positional_schema() {
        // No header row: country sits at the default index 10 and the first
        // row counts as data in both passes.
        let content = format!("{}\n{}", data_row(0, "Brazil"), data_row(1, "Brazil"));
        let mut session = session_over(&content);
        match discover(&mut session).await {
            DiscoveryOutcome::Values(summary) => {
                assert!(!summary.header_detected);
                assert_eq!(summary.rows_scanned, 2);
                assert_eq!(summary.values, vec!["Brazil"]);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        session.select_value("Brazil").unwrap();
        match session.preview(|_| {}, &CancelFlag::new()).await.unwrap() {
            PreviewOutcome::Preview(preview) => assert_eq!(preview.total, 2),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn cancellation_returns_to_the_preceding_stage() {
        let content = synthetic_file();
        let mut session = session_over(&content);
        let cancel = CancelFlag::new();
        cancel.cancel();
        match session.discover(|_| {}, &cancel).await.unwrap() {
            DiscoveryOutcome::Cancelled => {}
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(session.stage(), SessionStage::Upload);
        assert!(session.distinct_values().is_empty());

        // A fresh flag lets the same session run to completion.
        discover(&mut session).await;
        session.select_value("Brazil").unwrap();
        let cancel = CancelFlag::new();
        cancel.cancel();
        match session.preview(|_| {}, &cancel).await.unwrap() {
            PreviewOutcome::Cancelled => {}
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(session.stage(), SessionStage::Configuring);
    }

    #[tokio::test]
    async fn discovery_read_failure_returns_to_upload_with_row_count() {
        let content = format!(
            "{HEADER}\n{}\n{}\n{}",
            data_row(0, "Brazil"),
            data_row(1, "Peru"),
            data_row(2, "Chile"),
        );
        let mut session = SearchSession::new().unwrap();
        // Header plus two data rows arrive before the stream breaks.
        session.attach(Box::new(FaultySource::new(content, 1, 3)));

        let err = session
            .discover(|_| {}, &CancelFlag::new())
            .await
            .unwrap_err();
        match err {
            AppError::Ingestion { rows_processed, .. } => assert_eq!(rows_processed, 2),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(session.stage(), SessionStage::Upload);
        assert!(session.distinct_values().is_empty());
        assert_eq!(session.rows_scanned(), 0);
    }

    #[tokio::test]
    async fn selection_read_failure_returns_to_configuring_for_retry() {
        let content = format!("{HEADER}\n{}\n{}", data_row(0, "Brazil"), data_row(1, "Brazil"));
        let mut session = SearchSession::new().unwrap();
        // Only the second read (the selection pass) breaks.
        session.attach(Box::new(FaultySource::new(content, 2, 2)));
        discover(&mut session).await;
        session.select_value("Brazil").unwrap();

        let err = session
            .preview(|_| {}, &CancelFlag::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Ingestion {
                rows_processed: 1,
                ..
            }
        ));
        assert_eq!(session.stage(), SessionStage::Configuring);

        // The same selection retries without a re-upload or re-discovery.
        match session.preview(|_| {}, &CancelFlag::new()).await.unwrap() {
            PreviewOutcome::Preview(preview) => assert_eq!(preview.total, 2),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn progress_is_reported_at_interval_granularity() {
        let config = EngineConfig {
            progress_interval: 10,
            ..Default::default()
        };
        let content = synthetic_file();
        let mut session = SearchSession::with_config(config).unwrap();
        session.attach(Box::new(MemorySource::new(content, b',')));

        let mut ticks: Vec<u64> = Vec::new();
        session
            .discover(|p| ticks.push(p.rows_scanned), &CancelFlag::new())
            .await
            .unwrap();
        assert_eq!(ticks.len(), 100);
        assert_eq!(ticks[0], 10);
        assert_eq!(*ticks.last().unwrap(), 1000);
    }

    #[tokio::test]
    async fn stage_violations_are_state_errors() {
        let content = synthetic_file();
        let mut session = session_over(&content);
        assert!(session.select_value("Brazil").is_err());
        assert!(session.back_to_filter().is_err());
        assert!(session
            .preview(|_| {}, &CancelFlag::new())
            .await
            .is_err());

        discover(&mut session).await;
        // Selection pass without a chosen value is refused.
        assert!(session.export(|_| {}, &CancelFlag::new()).await.is_err());

        session.choose_another_file().unwrap();
        assert_eq!(session.stage(), SessionStage::Upload);
        assert!(session
            .discover(|_| {}, &CancelFlag::new())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn two_passes_over_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.csv");
        std::fs::write(&path, synthetic_file()).unwrap();

        let mut session = SearchSession::new().unwrap();
        let source = DelimitedSource::auto_detect(&path, 64 * 1024).unwrap();
        session.attach(Box::new(source));

        discover(&mut session).await;
        session.select_value("Brazil").unwrap();
        match session.export(|_| {}, &CancelFlag::new()).await.unwrap() {
            ExportOutcome::Artifact(artifact) => {
                assert_eq!(artifact.content.lines().count(), 38);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
