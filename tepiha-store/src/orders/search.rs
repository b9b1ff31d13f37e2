//! Multi-field order search
//!
//! A query is split on whitespace. Each record is matched on three fields and
//! the fields are ORed:
//!
//! | Field | Tokens used | Combination |
//! |-------|-------------|-------------|
//! | client name | tokens with a letter, folded | all must be substrings |
//! | client phone | every token reduced to digits (non-empty only) | any substring |
//! | code | every token as a code suffix | any equals or prefixes the record's suffix |

use shared::Order;
use shared::order::normalize::{code_suffix, digits_only, fold_name};
use std::collections::HashSet;

/// Parsed, normalized query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    name_tokens: Vec<String>,
    phone_tokens: Vec<String>,
    code_tokens: Vec<String>,
}

/// A token is numeric when it holds no letters (`"044-123"`, `"+383"`, `"7"`).
fn is_numeric_token(token: &str) -> bool {
    !token.chars().any(char::is_alphabetic)
}

impl SearchQuery {
    /// Parse a raw query. Returns `None` for an empty or blank query.
    pub fn parse(raw: &str) -> Option<Self> {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        if tokens.is_empty() {
            return None;
        }

        let name_tokens = tokens
            .iter()
            .filter(|t| !is_numeric_token(t))
            .map(|t| fold_name(t))
            .filter(|t| !t.is_empty())
            .collect();
        let phone_tokens = tokens
            .iter()
            .map(|t| digits_only(t))
            .filter(|t| !t.is_empty())
            .collect();
        let code_tokens = tokens.iter().map(|t| code_suffix(t)).collect();

        Some(Self {
            name_tokens,
            phone_tokens,
            code_tokens,
        })
    }

    fn matches_name(&self, order: &Order) -> bool {
        if self.name_tokens.is_empty() {
            return false;
        }
        let name = fold_name(&order.client_name);
        self.name_tokens.iter().all(|t| name.contains(t.as_str()))
    }

    fn matches_phone(&self, order: &Order) -> bool {
        if self.phone_tokens.is_empty() {
            return false;
        }
        let phone = digits_only(&order.client_phone);
        self.phone_tokens.iter().any(|t| phone.contains(t.as_str()))
    }

    fn matches_code(&self, order: &Order) -> bool {
        let suffix = order.code_suffix();
        self.code_tokens.iter().any(|t| suffix.starts_with(t.as_str()))
    }

    pub fn matches(&self, order: &Order) -> bool {
        self.matches_name(order) || self.matches_phone(order) || self.matches_code(order)
    }
}

/// Search the collection. Newest `updated_at` first, one entry per id.
pub fn search(orders: &[Order], raw_query: &str) -> Vec<Order> {
    let Some(query) = SearchQuery::parse(raw_query) else {
        return Vec::new();
    };

    let mut found: Vec<&Order> = orders.iter().filter(|o| query.matches(o)).collect();
    found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    let mut seen = HashSet::with_capacity(found.len());
    found
        .into_iter()
        .filter(|o| seen.insert(o.id.as_str()))
        .cloned()
        .collect()
}
