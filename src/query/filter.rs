use chrono::{DateTime, Utc};
use tracing::debug;

use super::{find_field, RESERVED_PARAMS};
use crate::error::MetricsError;

/// How the raw text of a filter value is interpreted for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    /// RFC 3339, e.g. `2026-02-07T10:00:00Z`.
    Timestamp,
}

/// One row of a field-name mapping table: public name, storage column, value kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        FieldSpec { name, column, kind }
    }

    fn parse_value(&self, raw: &str) -> Result<FieldValue, MetricsError> {
        let invalid = || {
            MetricsError::validation(format!(
                "invalid value '{}' for field '{}'",
                raw, self.name
            ))
        };
        match self.kind {
            FieldKind::Text => Ok(FieldValue::Text(raw.to_string())),
            FieldKind::Integer => raw
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| invalid()),
            FieldKind::Timestamp => DateTime::parse_from_rfc3339(raw)
                .map(|t| FieldValue::Timestamp(t.with_timezone(&Utc)))
                .map_err(|_| invalid()),
        }
    }
}

/// A typed filter value.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Timestamp(DateTime<Utc>),
}

/// Comparison operator, written as `field[op]=value` in the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Operator {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "eq" => Some(Operator::Eq),
            "ne" => Some(Operator::Ne),
            "gt" => Some(Operator::Gt),
            "gte" => Some(Operator::Gte),
            "lt" => Some(Operator::Lt),
            "lte" => Some(Operator::Lte),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
        }
    }

    /// Range operators compare against exactly one value.
    pub fn is_range(self) -> bool {
        !matches!(self, Operator::Eq | Operator::Ne)
    }
}

/// All values supplied for one (field, operator) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: &'static str,
    pub column: &'static str,
    pub op: Operator,
    pub values: Vec<FieldValue>,
}

/// A filter expressed in storage terms, ready for a store to execute.
///
/// `Eq` with several values means "any of", `Ne` means "none of".
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: &'static str,
    pub op: Operator,
    pub values: Vec<FieldValue>,
}

impl Condition {
    /// Evaluate the condition against a column value.
    pub fn matches(&self, actual: &FieldValue) -> bool {
        match self.op {
            Operator::Eq => self.values.iter().any(|v| v == actual),
            Operator::Ne => self.values.iter().all(|v| v != actual),
            Operator::Gt => self.values.iter().all(|v| actual > v),
            Operator::Gte => self.values.iter().all(|v| actual >= v),
            Operator::Lt => self.values.iter().all(|v| actual < v),
            Operator::Lte => self.values.iter().all(|v| actual <= v),
        }
    }
}

/// The filters parsed from a query string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    filters: Vec<Filter>,
}

impl FilterSet {
    /// Cap on the number of values a single filter may carry.
    pub const MAX_VALUES_PER_FIELD: usize = 50;

    /// Parse filters from query pairs.
    ///
    /// Accepts `field=a,b` (any of) and `field[op]=v`. Repeated keys accumulate.
    /// Keys that are reserved or not in `fields` are skipped.
    pub fn parse(
        params: &[(String, String)],
        fields: &'static [FieldSpec],
    ) -> Result<Self, MetricsError> {
        let mut set = FilterSet::default();

        for (key, raw) in params {
            if RESERVED_PARAMS.contains(&key.as_str()) {
                continue;
            }

            let (name, op) = match key.split_once('[') {
                Some((name, rest)) => {
                    let op_name = rest.strip_suffix(']').ok_or_else(|| {
                        MetricsError::validation(format!("malformed filter parameter '{}'", key))
                    })?;
                    (name, Some(op_name))
                }
                None => (key.as_str(), None),
            };

            let Some(spec) = find_field(fields, name) else {
                debug!("Ignoring unknown query parameter '{}'", key);
                continue;
            };

            let op = match op {
                None => Operator::Eq,
                Some(op_name) => Operator::parse(op_name).ok_or_else(|| {
                    MetricsError::validation(format!(
                        "unknown filter operator '{}' for field '{}'",
                        op_name, spec.name
                    ))
                })?,
            };

            let values = raw
                .split(',')
                .map(|v| spec.parse_value(v))
                .collect::<Result<Vec<_>, _>>()?;

            match set
                .filters
                .iter_mut()
                .find(|f| f.field == spec.name && f.op == op)
            {
                Some(existing) => existing.values.extend(values),
                None => set.filters.push(Filter {
                    field: spec.name,
                    column: spec.column,
                    op,
                    values,
                }),
            }
        }

        if let Some(f) = set
            .filters
            .iter()
            .find(|f| f.op.is_range() && f.values.len() != 1)
        {
            return Err(MetricsError::validation(format!(
                "operator '{}' on field '{}' expects a single value",
                f.op.as_str(),
                f.field
            )));
        }

        Ok(set)
    }

    #[cfg(test)]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// All filters on the given public field.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Filter> + 'a {
        self.filters.iter().filter(move |f| f.field == field)
    }

    /// Reject any field whose filters carry more than [`Self::MAX_VALUES_PER_FIELD`]
    /// values in total, across all operators.
    pub fn check_value_limits(&self) -> Result<(), MetricsError> {
        let mut counts: Vec<(&'static str, usize)> = Vec::new();
        for f in &self.filters {
            match counts.iter_mut().find(|(field, _)| *field == f.field) {
                Some((_, count)) => *count += f.values.len(),
                None => counts.push((f.field, f.values.len())),
            }
        }

        match counts
            .into_iter()
            .find(|(_, count)| *count > Self::MAX_VALUES_PER_FIELD)
        {
            Some((field, count)) => Err(MetricsError::validation(format!(
                "too many filter values for field '{}' (max: {}, got: {})",
                field,
                Self::MAX_VALUES_PER_FIELD,
                count
            ))),
            None => Ok(()),
        }
    }

    pub fn conditions(&self) -> Vec<Condition> {
        self.filters
            .iter()
            .map(|f| Condition {
                column: f.column,
                op: f.op,
                values: f.values.clone(),
            })
            .collect()
    }
}
