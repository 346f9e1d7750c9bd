use super::{find_field, FieldSpec};
use crate::error::MetricsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// An ordering clause in storage terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub direction: Direction,
}

/// Ordering parsed from `order=-createdAt,key` (a leading `-` sorts descending).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderSet {
    clauses: Vec<OrderBy>,
}

impl OrderSet {
    pub fn parse(
        params: &[(String, String)],
        fields: &'static [FieldSpec],
    ) -> Result<Self, MetricsError> {
        let mut clauses = Vec::new();

        let terms = params
            .iter()
            .filter(|(k, _)| k == "order")
            .flat_map(|(_, v)| v.split(','))
            .map(str::trim)
            .filter(|t| !t.is_empty());

        for term in terms {
            let (name, direction) = match term.strip_prefix('-') {
                Some(name) => (name, Direction::Desc),
                None => (term.strip_prefix('+').unwrap_or(term), Direction::Asc),
            };
            let spec = find_field(fields, name).ok_or_else(|| {
                MetricsError::validation(format!("invalid order field '{}'", name))
            })?;
            if clauses.iter().any(|c: &OrderBy| c.column == spec.column) {
                return Err(MetricsError::validation(format!(
                    "duplicate order field '{}'",
                    name
                )));
            }
            clauses.push(OrderBy {
                column: spec.column,
                direction,
            });
        }

        Ok(OrderSet { clauses })
    }

    #[cfg(test)]
    pub fn clauses(&self) -> &[OrderBy] {
        &self.clauses
    }

    pub fn into_clauses(self) -> Vec<OrderBy> {
        self.clauses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metric;

    fn order(value: &str) -> Result<OrderSet, MetricsError> {
        OrderSet::parse(&[("order".to_string(), value.to_string())], Metric::FIELDS)
    }

    #[test]
    fn test_parse_directions_and_mapping() {
        let set = order("-createdAt, key,+value").unwrap();
        assert_eq!(
            set.clauses(),
            &[
                OrderBy {
                    column: "created_at",
                    direction: Direction::Desc
                },
                OrderBy {
                    column: "key",
                    direction: Direction::Asc
                },
                OrderBy {
                    column: "value",
                    direction: Direction::Asc
                },
            ]
        );
    }

    #[test]
    fn test_no_order_param() {
        let set = OrderSet::parse(&[], Metric::FIELDS).unwrap();
        assert!(set.clauses().is_empty());
    }

    #[test]
    fn test_unknown_and_duplicate_fields_rejected() {
        assert_eq!(
            order("resource_id").unwrap_err().to_string(),
            "invalid order field 'resource_id'"
        );
        assert_eq!(
            order("key,-key").unwrap_err().to_string(),
            "duplicate order field 'key'"
        );
    }
}
