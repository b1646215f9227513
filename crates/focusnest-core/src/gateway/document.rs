//! Documents, queries and write batches understood by every store backend.
//!
//! Backends only persist opaque JSON objects keyed by collection and id.
//! Predicate matching, ordering and the effect of each write operation are
//! computed here so in-memory and SQLite stores behave identically.

use std::cmp::Ordering;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;

pub type Fields = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    /// Serialize a value into a document. The value must serialize to a JSON object.
    pub fn from_value<T: Serialize>(id: impl Into<String>, value: &T) -> Result<Self, StoreError> {
        let id = id.into();
        match serde_json::to_value(value)? {
            Value::Object(fields) => Ok(Self { id, fields }),
            other => Err(StoreError::Backend(format!(
                "document {id} must be an object, got {other}"
            ))),
        }
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        Ok(serde_json::from_value(Value::Object(self.fields.clone()))?)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// Total-enough ordering over JSON scalars. Mixed kinds are incomparable.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    /// Missing fields never match.
    pub fn matches(&self, fields: &Fields) -> bool {
        let Some(actual) = fields.get(&self.field) else {
            return false;
        };
        let Some(ord) = compare_values(actual, &self.value) else {
            return false;
        };
        match self.op {
            FilterOp::Eq => ord == Ordering::Equal,
            FilterOp::Lt => ord == Ordering::Less,
            FilterOp::Le => ord != Ordering::Greater,
            FilterOp::Gt => ord == Ordering::Greater,
            FilterOp::Ge => ord != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Conjunction of filters over one collection, optionally sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub collection: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub order_by: Option<OrderBy>,
}

impl Query {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(field, value))
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.filters.iter().all(|f| f.matches(&doc.fields))
    }

    /// Filter and sort candidate documents of this query's collection.
    /// Ties keep their input order.
    pub fn apply(&self, docs: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut out: Vec<Document> = docs.into_iter().filter(|d| self.matches(d)).collect();
        if let Some(order) = &self.order_by {
            out.sort_by(|a, b| {
                let ord = match (a.get(&order.field), b.get(&order.field)) {
                    (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                match order.direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            });
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldChange {
    Set { field: String, value: Value },
    /// Atomic numeric add; a missing field counts as zero.
    Increment { field: String, by: i64 },
}

impl FieldChange {
    pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        FieldChange::Set {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn increment(field: impl Into<String>, by: i64) -> Self {
        FieldChange::Increment {
            field: field.into(),
            by,
        }
    }
}

/// Field value that must hold at commit time for the batch to apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Precondition {
    pub field: String,
    pub expected: Value,
}

impl Precondition {
    pub fn new(field: impl Into<String>, expected: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WriteOp {
    /// Fails with `AlreadyExists` if the document is present.
    Create { collection: String, document: Document },
    /// Create or replace.
    Put { collection: String, document: Document },
    /// Fails with `NotFound` if absent, `PreconditionFailed` if a precondition does not hold.
    Update {
        collection: String,
        id: String,
        changes: Vec<FieldChange>,
        preconditions: Vec<Precondition>,
    },
    /// Apply changes, creating the document if absent.
    Merge {
        collection: String,
        id: String,
        changes: Vec<FieldChange>,
    },
}

impl WriteOp {
    pub fn collection(&self) -> &str {
        match self {
            WriteOp::Create { collection, .. }
            | WriteOp::Put { collection, .. }
            | WriteOp::Update { collection, .. }
            | WriteOp::Merge { collection, .. } => collection,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            WriteOp::Create { document, .. } | WriteOp::Put { document, .. } => &document.id,
            WriteOp::Update { id, .. } | WriteOp::Merge { id, .. } => id,
        }
    }

    /// Compute the document body after this operation.
    pub fn apply(&self, existing: Option<&Fields>) -> Result<Fields, StoreError> {
        let collection = self.collection();
        let id = self.id();
        match self {
            WriteOp::Create { document, .. } => match existing {
                Some(_) => Err(StoreError::AlreadyExists {
                    collection: collection.to_string(),
                    id: id.to_string(),
                }),
                None => Ok(document.fields.clone()),
            },
            WriteOp::Put { document, .. } => Ok(document.fields.clone()),
            WriteOp::Update {
                changes,
                preconditions,
                ..
            } => {
                let Some(current) = existing else {
                    return Err(StoreError::NotFound {
                        collection: collection.to_string(),
                        id: id.to_string(),
                    });
                };
                for pre in preconditions {
                    let holds = current
                        .get(&pre.field)
                        .and_then(|v| compare_values(v, &pre.expected))
                        == Some(Ordering::Equal);
                    if !holds {
                        return Err(StoreError::PreconditionFailed {
                            collection: collection.to_string(),
                            id: id.to_string(),
                            field: pre.field.clone(),
                        });
                    }
                }
                let mut fields = current.clone();
                apply_changes(&mut fields, changes, collection, id)?;
                Ok(fields)
            }
            WriteOp::Merge { changes, .. } => {
                let mut fields = existing.cloned().unwrap_or_default();
                fields
                    .entry("id")
                    .or_insert_with(|| Value::String(id.to_string()));
                apply_changes(&mut fields, changes, collection, id)?;
                Ok(fields)
            }
        }
    }
}

fn apply_changes(
    fields: &mut Fields,
    changes: &[FieldChange],
    collection: &str,
    id: &str,
) -> Result<(), StoreError> {
    for change in changes {
        match change {
            FieldChange::Set { field, value } => {
                fields.insert(field.clone(), value.clone());
            }
            FieldChange::Increment { field, by } => {
                let next = match fields.get(field) {
                    None | Some(Value::Null) => Value::from(*by),
                    Some(Value::Number(n)) => match n.as_i64() {
                        Some(i) => Value::from(i.saturating_add(*by)),
                        None => Value::from(n.as_f64().unwrap_or(0.0) + *by as f64),
                    },
                    Some(_) => {
                        return Err(StoreError::NotNumeric {
                            collection: collection.to_string(),
                            id: id.to_string(),
                            field: field.clone(),
                        })
                    }
                };
                fields.insert(field.clone(), next);
            }
        }
    }
    Ok(())
}

/// Ordered list of writes that commit or fail as a unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    pub fn create(&mut self, collection: &str, document: Document) -> &mut Self {
        self.push(WriteOp::Create {
            collection: collection.to_string(),
            document,
        })
    }

    pub fn put(&mut self, collection: &str, document: Document) -> &mut Self {
        self.push(WriteOp::Put {
            collection: collection.to_string(),
            document,
        })
    }

    pub fn update(
        &mut self,
        collection: &str,
        id: &str,
        changes: Vec<FieldChange>,
        preconditions: Vec<Precondition>,
    ) -> &mut Self {
        self.push(WriteOp::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            changes,
            preconditions,
        })
    }

    pub fn merge(&mut self, collection: &str, id: &str, changes: Vec<FieldChange>) -> &mut Self {
        self.push(WriteOp::Merge {
            collection: collection.to_string(),
            id: id.to_string(),
            changes,
        })
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
