//! Declarative queries over stored documents.
//!
//! Filter keys follow the `"Field op"` convention (`"Name ="`, `"Age>="`);
//! a key without an operator is an equality test. Order keys are field
//! names, prefixed with `-` for descending order.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::storage::StoreError;

/// Filter, ordering, projection and paging for FindBy and Count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    /// `"Field op"` → value.
    pub filters: BTreeMap<String, Value>,
    pub order: Vec<String>,
    /// Projection; empty keeps every field.
    pub fields: Vec<String>,
    /// 0 means no limit.
    pub limit: usize,
    pub offset: usize,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn order(mut self, field: impl Into<String>) -> Self {
        self.order.push(field.into());
        self
    }

    pub fn project<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Evaluate the query against `(id, document)` pairs in id order.
    pub fn apply<'a, I>(&self, documents: I) -> Result<Vec<(i64, Value)>, StoreError>
    where
        I: IntoIterator<Item = (i64, &'a Value)>,
    {
        let filters = self
            .filters
            .iter()
            .map(|(key, value)| Filter::parse(key, value.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        let order = self
            .order
            .iter()
            .map(|key| SortKey::parse(key))
            .collect::<Result<Vec<_>, _>>()?;

        let mut matched: Vec<(i64, &Value)> = documents
            .into_iter()
            .filter(|(_, doc)| filters.iter().all(|f| f.matches(doc)))
            .collect();

        if !order.is_empty() {
            matched.sort_by(|(_, a), (_, b)| {
                order
                    .iter()
                    .map(|key| key.compare(a, b))
                    .find(|o| *o != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        let take = if self.limit == 0 { usize::MAX } else { self.limit };
        Ok(matched
            .into_iter()
            .skip(self.offset)
            .take(take)
            .map(|(id, doc)| (id, self.projection(doc)))
            .collect())
    }

    fn projection(&self, doc: &Value) -> Value {
        if self.fields.is_empty() {
            return doc.clone();
        }
        let mut projected = Map::new();
        for field in &self.fields {
            if let Some(value) = doc.get(field) {
                projected.insert(field.clone(), value.clone());
            }
        }
        Value::Object(projected)
    }
}

/// Comparison operators accepted in filter keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Operator {
    // Two-character operators first so "<=" is not read as "=".
    const SUFFIXES: [(&'static str, Operator); 6] = [
        ("!=", Operator::Ne),
        ("<=", Operator::Le),
        (">=", Operator::Ge),
        ("=", Operator::Eq),
        ("<", Operator::Lt),
        (">", Operator::Gt),
    ];
}

#[derive(Debug)]
struct Filter {
    field: String,
    op: Operator,
    value: Value,
}

impl Filter {
    fn parse(key: &str, value: Value) -> Result<Self, StoreError> {
        let key = key.trim();
        let (field, op) = Operator::SUFFIXES
            .iter()
            .find_map(|(suffix, op)| key.strip_suffix(suffix).map(|f| (f.trim_end(), *op)))
            .unwrap_or((key, Operator::Eq));
        if field.is_empty() {
            return Err(StoreError::InvalidQuery(format!("filter {:?} has no field", key)));
        }
        Ok(Self {
            field: field.to_string(),
            op,
            value,
        })
    }

    fn matches(&self, doc: &Value) -> bool {
        let actual = doc.get(&self.field).unwrap_or(&Value::Null);
        let ordering = compare_values(actual, &self.value);
        match self.op {
            Operator::Eq => ordering == Some(Ordering::Equal),
            Operator::Ne => ordering != Some(Ordering::Equal),
            Operator::Lt => ordering == Some(Ordering::Less),
            Operator::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
            Operator::Gt => ordering == Some(Ordering::Greater),
            Operator::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        }
    }
}

#[derive(Debug)]
struct SortKey {
    field: String,
    descending: bool,
}

impl SortKey {
    fn parse(key: &str) -> Result<Self, StoreError> {
        let key = key.trim();
        let (field, descending) = match key.strip_prefix('-') {
            Some(field) => (field, true),
            None => (key, false),
        };
        if field.is_empty() {
            return Err(StoreError::InvalidQuery("empty order field".into()));
        }
        Ok(Self {
            field: field.to_string(),
            descending,
        })
    }

    fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let a = a.get(&self.field).unwrap_or(&Value::Null);
        let b = b.get(&self.field).unwrap_or(&Value::Null);
        let ordering = compare_values(a, b).unwrap_or(Ordering::Equal);
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

/// Orders two JSON scalars of the same type; `None` when incomparable.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
        },
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (a, b) if a == b => Some(Ordering::Equal),
        _ => None,
    }
}
