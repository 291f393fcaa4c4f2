// ============================================================
// HEADER ROLE RESOLVER
// ============================================================
// Deterministic, priority-ordered mapping of header tokens to roles

use crate::domain::table::{ColumnRoleMap, RawRow, RoleSpec, RoleTable};

/// Result of resolving the first row of a file.
#[derive(Debug, Clone)]
pub enum HeaderResolution {
    /// A usable header row: roles mapped, anchor guaranteed resolved.
    Detected(ColumnRoleMap),
    /// No role signal at all, or the target dimension could not be placed.
    /// The caller falls back to the table's positional schema and treats the
    /// row as ordinary data.
    NotFound,
}

/// Resolves one role table against raw header tokens. The same resolver
/// serves both the filter engine and the contact extractor; only the table
/// differs.
pub struct HeaderResolver {
    table: RoleTable,
}

impl HeaderResolver {
    pub fn new(table: RoleTable) -> Self {
        Self { table }
    }

    /// Resolve roles against the first row's tokens, lower-cased and
    /// trimmed. Per role, in strict priority order with the first hit
    /// winning: exact candidate equality, then prefix match, then substring
    /// match, both partial tiers subject to the role's exclude list.
    /// Candidate order outranks header order within a tier, so
    /// `registrant_country` beats a later-listed bare `country`.
    pub fn resolve(&self, header_row: &RawRow) -> HeaderResolution {
        let headers: Vec<String> = header_row
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();

        let mut map = ColumnRoleMap::new();
        for spec in self.table.specs() {
            if let Some(index) = locate(&headers, spec, &map) {
                map.assign(spec.role, index);
            }
        }

        // No token matched any role: this is not a header row.
        if map.is_empty() {
            return HeaderResolution::NotFound;
        }

        // A missing target dimension makes the whole mapping unusable for
        // discovery; degrade to the positional schema instead of failing.
        if let Some(target) = self.table.target() {
            if map.index_of(target).is_none() {
                return HeaderResolution::NotFound;
            }
        }

        // The anchor column must exist for the pass to produce anything;
        // default it to the first column rather than leaving it unresolved.
        let anchor = self.table.anchor();
        if map.index_of(anchor).is_none() {
            map.force(anchor, 0);
        }

        HeaderResolution::Detected(map)
    }
}

fn locate(headers: &[String], spec: &RoleSpec, claimed: &ColumnRoleMap) -> Option<usize> {
    let excluded =
        |header: &str| spec.excludes.iter().any(|needle| header.contains(needle));

    // Tier 1: exact equality, tried for every candidate before any fallback.
    for candidate in spec.candidates {
        for (index, header) in headers.iter().enumerate() {
            if !claimed.is_claimed(index) && header == candidate {
                return Some(index);
            }
        }
    }

    // Tier 2: prefix match.
    for candidate in spec.candidates {
        for (index, header) in headers.iter().enumerate() {
            if !claimed.is_claimed(index) && header.starts_with(candidate) && !excluded(header) {
                return Some(index);
            }
        }
    }

    // Tier 3: substring match.
    for candidate in spec.candidates {
        for (index, header) in headers.iter().enumerate() {
            if !claimed.is_claimed(index) && header.contains(candidate) && !excluded(header) {
                return Some(index);
            }
        }
    }

    None
}
