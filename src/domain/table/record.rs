// ============================================================
// CANONICAL RECORDS
// ============================================================
// Fixed-shape, role-named output structures

use serde::{Deserialize, Serialize};

/// The normalized representation of one matching row in the filter engine.
/// Every field is a trimmed string; unresolved roles and absent cells read
/// as the empty string so export never emits a sentinel token.
///
/// Field naming follows the fixed export contract, not the internal role
/// names: `name` is sourced from the registrar role, `registrant_name` from
/// the company role, and `registrant_organization` from the name role. The
/// reassignment is deliberate and must be preserved for output
/// compatibility.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub domain_name: String,
    pub created_date: String,
    pub expires_date: String,
    pub name: String,
    pub registrant_name: String,
    pub registrant_organization: String,
    pub registrant_street1: String,
    pub registrant_city: String,
    pub registrant_state: String,
    pub registrant_postal_code: String,
    pub registrant_country: String,
    pub email: String,
    pub number: String,
}

/// One harvested contact tuple. Country is optional in the source data and
/// defaults to empty, never to a null-like sentinel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub email: String,
    pub number: String,
    pub country: String,
}
