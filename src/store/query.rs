use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use super::document::{Document, VersionedDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `field <op> value`; fields may be dotted paths into nested objects.
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
    /// `field` is an array holding at least one object whose `key` equals `value`.
    ArrayContains {
        field: String,
        key: String,
        value: Value,
    },
}

impl Filter {
    fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::Compare { field, op, value } => {
                let Some(actual) = lookup(doc, field) else {
                    return false;
                };
                // Equality is exact; typed coercion only applies to ordering.
                if *op == CompareOp::Eq {
                    return actual == value;
                }
                compare_values(actual, value).is_some_and(|ordering| match op {
                    CompareOp::Lt => ordering == Ordering::Less,
                    CompareOp::Lte => ordering != Ordering::Greater,
                    CompareOp::Gt => ordering == Ordering::Greater,
                    CompareOp::Gte => ordering != Ordering::Less,
                    CompareOp::Eq => ordering == Ordering::Equal,
                })
            }
            Filter::ArrayContains { field, key, value } => match lookup(doc, field) {
                Some(Value::Array(items)) => items.iter().any(|item| item.get(key) == Some(value)),
                _ => false,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// A collection query: filters are AND-ed, then ordering, then limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_op(field, CompareOp::Eq, value)
    }

    pub fn where_op(mut self, field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Compare {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn where_array_contains(
        mut self,
        field: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.filters.push(Filter::ArrayContains {
            field: field.into(),
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.filters.iter().all(|f| f.matches(doc))
    }

    /// Filters, orders and truncates a set of candidate documents.
    pub fn apply(&self, mut docs: Vec<VersionedDocument>) -> Vec<VersionedDocument> {
        docs.retain(|d| self.matches(&d.data));
        // Stable base order so equal sort keys come back deterministically.
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        if let Some(order) = &self.order_by {
            docs.sort_by(|a, b| {
                let ordering = match (lookup(&a.data, &order.field), lookup(&b.data, &order.field)) {
                    (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                    // Documents missing the field sort last in either direction.
                    (Some(_), None) => return Ordering::Less,
                    (None, Some(_)) => return Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                match order.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }
        if let Some(limit) = self.limit {
            docs.truncate(limit);
        }
        docs
    }
}

fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = current.get(part)?;
    }
    Some(current)
}

/// Orders two JSON values: numbers numerically, timestamps chronologically,
/// decimal strings numerically, other strings lexically. Mixed types are
/// incomparable.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(compare_strings(x, y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn compare_strings(x: &str, y: &str) -> Ordering {
    if let (Ok(a), Ok(b)) = (x.parse::<DateTime<Utc>>(), y.parse::<DateTime<Utc>>()) {
        return a.cmp(&b);
    }
    if let (Ok(a), Ok(b)) = (x.parse::<Decimal>(), y.parse::<Decimal>()) {
        return a.cmp(&b);
    }
    x.cmp(y)
}
