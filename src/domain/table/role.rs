// ============================================================
// COLUMN ROLES
// ============================================================
// Semantic roles, candidate tables, and the resolved role -> index map

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::row::{cell_at, RawRow};

/// A semantic meaning assigned to at most one column index during header
/// resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnRole {
    Domain,
    Country,
    Email,
    Name,
    Phone,
    Company,
    Registrar,
    Address,
    City,
    State,
    Zip,
    CreateDate,
    ExpiryDate,
}

/// Matching rules for one role: candidate header names tried in order, plus
/// substrings that disqualify a partial match (e.g. "fax" for phone-like
/// roles).
#[derive(Debug, Clone)]
pub struct RoleSpec {
    pub role: ColumnRole,
    pub candidates: &'static [&'static str],
    pub excludes: &'static [&'static str],
}

/// A complete role table for one call site: the ordered specs, the anchor
/// role that is force-defaulted to column 0 when unresolved, the target
/// dimension (if any) whose absence means "no header detected", and the
/// positional fallback schema used in that case.
#[derive(Debug, Clone)]
pub struct RoleTable {
    specs: Vec<RoleSpec>,
    anchor: ColumnRole,
    target: Option<ColumnRole>,
    positional_defaults: Vec<(ColumnRole, usize)>,
}

impl RoleTable {
    /// Role table for the country-filter engine: the 13-role set resolved
    /// against provider exports, with the fixed 13-column positional schema
    /// as headerless fallback.
    pub fn filter() -> Self {
        FILTER_TABLE.clone()
    }

    /// Role table for the contact-extraction variant.
    pub fn contacts() -> Self {
        CONTACT_TABLE.clone()
    }

    pub fn specs(&self) -> &[RoleSpec] {
        &self.specs
    }

    pub fn anchor(&self) -> ColumnRole {
        self.anchor
    }

    pub fn target(&self) -> Option<ColumnRole> {
        self.target
    }

    /// Candidate names for a role, used by the self-header guard.
    pub fn candidates(&self, role: ColumnRole) -> &'static [&'static str] {
        self.specs
            .iter()
            .find(|s| s.role == role)
            .map(|s| s.candidates)
            .unwrap_or(&[])
    }

    /// The positional fallback as a ready-to-use role map.
    pub fn positional_map(&self) -> ColumnRoleMap {
        let mut map = ColumnRoleMap::new();
        for (role, index) in &self.positional_defaults {
            map.assign(*role, *index);
        }
        map
    }

    /// Override the headerless fallback schema. The hard-coded provider
    /// schema stays the out-of-the-box default.
    pub fn with_positional_defaults(mut self, defaults: Vec<(ColumnRole, usize)>) -> Self {
        self.positional_defaults = defaults;
        self
    }
}

static FILTER_TABLE: Lazy<RoleTable> = Lazy::new(|| RoleTable {
    specs: vec![
        RoleSpec {
            role: ColumnRole::Domain,
            candidates: &["domain_name", "domainname", "domain"],
            excludes: &[],
        },
        RoleSpec {
            role: ColumnRole::Country,
            candidates: &["registrant_country", "country"],
            excludes: &[],
        },
        RoleSpec {
            role: ColumnRole::Email,
            candidates: &["registrant_email", "contact_email", "email"],
            excludes: &[],
        },
        RoleSpec {
            role: ColumnRole::Name,
            candidates: &["registrant_name", "contact_name", "name"],
            excludes: &["domain", "registrar", "company", "server"],
        },
        RoleSpec {
            role: ColumnRole::Phone,
            candidates: &["registrant_phone", "phone", "telephone", "contact_number"],
            excludes: &["fax", "extension", "ext"],
        },
        RoleSpec {
            role: ColumnRole::Company,
            candidates: &["registrant_organization", "organization", "company"],
            excludes: &[],
        },
        RoleSpec {
            role: ColumnRole::Registrar,
            candidates: &["registrar_name", "registrar"],
            excludes: &[],
        },
        RoleSpec {
            role: ColumnRole::Address,
            candidates: &["registrant_street1", "registrant_address", "street", "address"],
            excludes: &["mail"],
        },
        RoleSpec {
            role: ColumnRole::City,
            candidates: &["registrant_city", "city"],
            excludes: &[],
        },
        RoleSpec {
            role: ColumnRole::State,
            candidates: &["registrant_state", "state", "province"],
            excludes: &[],
        },
        RoleSpec {
            role: ColumnRole::Zip,
            candidates: &["registrant_postalcode", "postal_code", "zipcode", "zip"],
            excludes: &[],
        },
        RoleSpec {
            role: ColumnRole::CreateDate,
            candidates: &["createddate", "created_date", "creation_date", "create_date"],
            excludes: &[],
        },
        RoleSpec {
            role: ColumnRole::ExpiryDate,
            candidates: &["expiresdate", "expires_date", "expiry_date", "expiration_date"],
            excludes: &[],
        },
    ],
    anchor: ColumnRole::Domain,
    target: Some(ColumnRole::Country),
    positional_defaults: vec![
        (ColumnRole::Domain, 0),
        (ColumnRole::CreateDate, 1),
        (ColumnRole::ExpiryDate, 2),
        (ColumnRole::Registrar, 3),
        (ColumnRole::Company, 4),
        (ColumnRole::Name, 5),
        (ColumnRole::Address, 6),
        (ColumnRole::City, 7),
        (ColumnRole::State, 8),
        (ColumnRole::Zip, 9),
        (ColumnRole::Country, 10),
        (ColumnRole::Email, 11),
        (ColumnRole::Phone, 12),
    ],
});

static CONTACT_TABLE: Lazy<RoleTable> = Lazy::new(|| RoleTable {
    specs: vec![
        RoleSpec {
            role: ColumnRole::Name,
            candidates: &["full_name", "first_name", "name", "contact"],
            excludes: &["domain", "company"],
        },
        RoleSpec {
            role: ColumnRole::Email,
            candidates: &["email", "e-mail", "mail"],
            excludes: &[],
        },
        RoleSpec {
            role: ColumnRole::Phone,
            candidates: &["phone", "mobile", "telephone", "number", "whatsapp"],
            excludes: &["fax", "extension", "ext"],
        },
        RoleSpec {
            role: ColumnRole::Country,
            candidates: &["country", "nation", "region"],
            excludes: &[],
        },
    ],
    anchor: ColumnRole::Name,
    target: None,
    positional_defaults: vec![
        (ColumnRole::Name, 0),
        (ColumnRole::Email, 1),
        (ColumnRole::Phone, 2),
        (ColumnRole::Country, 3),
    ],
});

/// The resolved mapping from roles to column indices. Built once per file
/// during the discovery pass and immutable afterward.
///
/// Invariants: each role maps to at most one index, and an index is claimed
/// by at most one role (first assignment wins).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnRoleMap {
    entries: Vec<(ColumnRole, usize)>,
}

impl ColumnRoleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a role to a column. Returns false without modifying the map if
    /// the role is already resolved or the index is claimed by another role.
    pub fn assign(&mut self, role: ColumnRole, index: usize) -> bool {
        if self.index_of(role).is_some() || self.is_claimed(index) {
            return false;
        }
        self.entries.push((role, index));
        true
    }

    /// Anchor fallback only: set a role unconditionally, bypassing the
    /// collision check so an unresolved anchor can land on column 0 even
    /// when another role sits there.
    pub fn force(&mut self, role: ColumnRole, index: usize) {
        if let Some(entry) = self.entries.iter_mut().find(|(r, _)| *r == role) {
            entry.1 = index;
        } else {
            self.entries.push((role, index));
        }
    }

    pub fn index_of(&self, role: ColumnRole) -> Option<usize> {
        self.entries
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, i)| *i)
    }

    pub fn is_claimed(&self, index: usize) -> bool {
        self.entries.iter().any(|(_, i)| *i == index)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read the cell this role resolves to, or the empty string when the
    /// role is unresolved or the row is short.
    pub fn cell<'a>(&self, row: &'a RawRow, role: ColumnRole) -> &'a str {
        cell_at(row, self.index_of(role))
    }
}
