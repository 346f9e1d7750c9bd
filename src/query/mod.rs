//! Query-string parsing for collection endpoints.
//!
//! Turns `?field=...&order=...&limit=...` into typed filter conditions,
//! ordering clauses and pagination parameters that a store can execute.

pub mod filter;
pub mod order;
pub mod pagination;

pub use filter::{Condition, FieldKind, FieldSpec, FieldValue, Filter, FilterSet, Operator};
pub use order::{Direction, OrderBy, OrderSet};
pub use pagination::{Collection, PageRequest};

/// Query keys that never name a filter field.
pub const RESERVED_PARAMS: &[&str] = &["limit", "page", "count", "order"];

/// Look up a public field name in a mapping table.
pub fn find_field(fields: &'static [FieldSpec], name: &str) -> Option<&'static FieldSpec> {
    fields.iter().find(|f| f.name == name)
}
