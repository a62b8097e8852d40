//! Query model and canonical serialization.
//!
//! A `Query` is a filter/sort/limit/skip tuple against one resource. Its
//! canonical string form is used both to build the transport request and to
//! derive the query-cache key, so the two can never disagree. Filters are
//! kept in a `BTreeMap` to make the serialization independent of the order
//! fields were added in.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

/// Filter operators supported by the backend's query translation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    Regex,
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Eq => "eq",
            Op::Ne => "ne",
            Op::Gt => "gt",
            Op::Gte => "gte",
            Op::Lt => "lt",
            Op::Lte => "lte",
            Op::In => "in",
            Op::Nin => "nin",
            Op::Regex => "regex",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A predicate on a single field: plain equality or an operator form.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Value(Value),
    Ops(BTreeMap<Op, Value>),
}

impl Predicate {
    pub fn eq(value: impl Into<Value>) -> Self {
        Predicate::Value(value.into())
    }

    pub fn op(op: Op, value: impl Into<Value>) -> Self {
        let mut ops = BTreeMap::new();
        ops.insert(op, value.into());
        Predicate::Ops(ops)
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::op(Op::Regex, pattern.into())
    }

    /// Add another operator to an existing predicate, e.g. a gte/lt range.
    pub fn and(self, op: Op, value: impl Into<Value>) -> Self {
        let mut ops = match self {
            Predicate::Value(value) => {
                let mut ops = BTreeMap::new();
                ops.insert(Op::Eq, value);
                ops
            }
            Predicate::Ops(ops) => ops,
        };
        ops.insert(op, value.into());
        Predicate::Ops(ops)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: String,
    pub direction: Direction,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }
}

/// A filter/sort/limit/skip tuple against one resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: BTreeMap<String, Predicate>,
    pub sort: Option<Sort>,
    pub limit: Option<u32>,
    pub skip: Option<u32>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: impl Into<String>, predicate: Predicate) -> Self {
        self.filter.insert(field.into(), predicate);
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Deterministic query-string form.
    ///
    /// Fields come out in sorted order with operator-qualified names, e.g.
    /// `filter[title][regex]=cat&limit=10`. Two queries that differ only in
    /// the order their filters were added produce identical strings.
    pub fn canonical(&self) -> String {
        let mut parts = Vec::new();
        for (field, predicate) in &self.filter {
            match predicate {
                Predicate::Value(value) => {
                    parts.push(format!("filter[{}]={}", field, encode_value(value)));
                }
                Predicate::Ops(ops) => {
                    for (op, value) in ops {
                        parts.push(format!("filter[{}][{}]={}", field, op, encode_value(value)));
                    }
                }
            }
        }
        if let Some(ref sort) = self.sort {
            parts.push(format!("sort={}:{}", sort.field, sort.direction.as_str()));
        }
        if let Some(limit) = self.limit {
            parts.push(format!("limit={}", limit));
        }
        if let Some(skip) = self.skip {
            parts.push(format!("skip={}", skip));
        }
        parts.join("&")
    }
}

fn encode_value(value: &Value) -> String {
    match value {
        Value::String(s) => escape(s),
        Value::Array(items) => {
            let encoded: Vec<String> = items.iter().map(encode_value).collect();
            encoded.join(",")
        }
        other => other.to_string(),
    }
}

/// Percent-encode the characters that would corrupt the query string.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' | '=' | '#' | '%' | '+' | ' ' | '[' | ']' | ',' | '?' => {
                out.push_str(&format!("%{:02X}", c as u32));
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_is_order_insensitive() {
        let a = Query::new()
            .filter("title", Predicate::regex("cat"))
            .filter("published", Predicate::eq(true));
        let b = Query::new()
            .filter("published", Predicate::eq(true))
            .filter("title", Predicate::regex("cat"));

        assert_eq!(a.canonical(), b.canonical());
        assert_eq!(
            a.canonical(),
            "filter[published]=true&filter[title][regex]=cat"
        );
    }

    #[test]
    fn test_canonical_full_tuple() {
        let query = Query::new()
            .filter("tags", Predicate::op(Op::In, json!(["art", "oil"])))
            .sort(Sort::desc("title"))
            .limit(10)
            .skip(20);

        assert_eq!(
            query.canonical(),
            "filter[tags][in]=art,oil&sort=title:desc&limit=10&skip=20"
        );
    }

    #[test]
    fn test_canonical_empty_query() {
        assert_eq!(Query::new().canonical(), "");
    }

    #[test]
    fn test_range_predicate() {
        let query = Query::new().filter(
            "order",
            Predicate::op(Op::Gte, 1).and(Op::Lt, 10),
        );
        assert_eq!(
            query.canonical(),
            "filter[order][gte]=1&filter[order][lt]=10"
        );
    }

    #[test]
    fn test_escape_reserved_characters() {
        let query = Query::new().filter("title", Predicate::eq("a&b=c d"));
        assert_eq!(query.canonical(), "filter[title]=a%26b%3Dc%20d");
    }
}
