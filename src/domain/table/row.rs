// ============================================================
// RAW ROW
// ============================================================
// Positional row representation produced by the tokenizer adapters

/// One physical row of input: an ordered sequence of string cells with no
/// inherent column semantics. Column meaning is assigned later through a
/// resolved `ColumnRoleMap`.
pub type RawRow = Vec<String>;

/// Positional cell access that never panics: a missing index reads as the
/// empty string so downstream normalization never sees a sentinel.
pub fn cell_at(row: &RawRow, index: Option<usize>) -> &str {
    index
        .and_then(|i| row.get(i))
        .map(String::as_str)
        .unwrap_or("")
}

/// A row whose cells are all blank carries no information and is skipped by
/// every adapter.
pub fn is_blank_row(row: &RawRow) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}
