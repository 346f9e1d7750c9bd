use schemars::JsonSchema;
use serde::Serialize;

use crate::error::MetricsError;

/// Page selection for a list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: usize,
    pub page: usize,
    pub include_count: bool,
}

impl PageRequest {
    /// Hard ceiling on the page number.
    pub const MAX_PAGE: usize = 10_000;

    /// Read `limit`, `page` and `count` from the query.
    ///
    /// `limit` defaults to `default_limit` and is clamped to `max_limit`; `page`
    /// defaults to 1 and is clamped to [`Self::MAX_PAGE`]. Non-numeric values
    /// are rejected. Only `count=false` disables the total.
    pub fn from_params(
        params: &[(String, String)],
        default_limit: usize,
        max_limit: usize,
    ) -> Result<Self, MetricsError> {
        let limit = match parse_int(params, "limit")? {
            Some(l) if l >= 1 => (l as usize).min(max_limit),
            _ => default_limit,
        };

        let page = match parse_int(params, "page")? {
            Some(p) if p >= 1 => (p as usize).min(Self::MAX_PAGE),
            _ => 1,
        };

        let include_count = last_value(params, "count") != Some("false");

        Ok(PageRequest {
            limit,
            page,
            include_count,
        })
    }

    pub fn offset(&self) -> usize {
        (self.page - 1) * self.limit
    }
}

fn last_value<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn parse_int(params: &[(String, String)], key: &str) -> Result<Option<i64>, MetricsError> {
    match last_value(params, key) {
        None | Some("") => Ok(None),
        Some(raw) => {
            let digits = raw.trim();
            match digits.parse::<i64>() {
                Ok(n) => Ok(Some(n)),
                // Out of i64 range but still a number: saturate so the caller clamps it.
                Err(_) if is_integer_literal(digits) => Ok(Some(if digits.starts_with('-') {
                    i64::MIN
                } else {
                    i64::MAX
                })),
                Err(_) => Err(MetricsError::validation(format!(
                    "{} must be an integer, got '{}'",
                    key, raw
                ))),
            }
        }
    }
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// A page of items; `total` is present only when counting was requested.
#[derive(Serialize, Debug, Clone, JsonSchema)]
pub struct Collection<T> {
    pub items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    pub limit: usize,
    pub page: usize,
}
