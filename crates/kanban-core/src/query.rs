//! Minimal structured query understood by document stores.

use crate::document::{Document, DocumentSnapshot, FieldValue};
use std::cmp::Ordering;

/// Sort direction for [`OrderBy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

/// Placement of documents whose order field is null or missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullsOrder {
    /// Before every non-null value.
    First,
    /// After every non-null value.
    #[default]
    Last,
}

/// Ordering clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Field to sort on.
    pub field: String,
    /// Direction for non-null values.
    pub direction: Direction,
    /// Null placement, independent of direction.
    pub nulls: NullsOrder,
}

/// Equality filters plus an optional order over one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Collection to read.
    pub collection: String,
    /// `field == value` clauses, all of which must hold.
    pub filters: Vec<(String, FieldValue)>,
    /// Optional ordering; document id breaks ties.
    pub order_by: Option<OrderBy>,
}

impl Query {
    /// Query every document of `collection`.
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: None,
        }
    }

    /// Add an equality clause.
    #[must_use]
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    /// Set the ordering.
    #[must_use]
    pub fn order_by(
        mut self,
        field: impl Into<String>,
        direction: Direction,
        nulls: NullsOrder,
    ) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
            nulls,
        });
        self
    }

    /// Whether a document satisfies every filter.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        self.filters
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }

    /// Filter and order documents into a snapshot.
    #[must_use]
    pub fn evaluate<'a, I>(&self, documents: I) -> Vec<DocumentSnapshot>
    where
        I: IntoIterator<Item = (&'a String, &'a Document)>,
    {
        let mut hits: Vec<DocumentSnapshot> = documents
            .into_iter()
            .filter(|(_, doc)| self.matches(doc))
            .map(|(id, doc)| DocumentSnapshot::new(id.clone(), doc.clone()))
            .collect();
        hits.sort_by(|a, b| self.compare(a, b));
        hits
    }

    fn compare(&self, a: &DocumentSnapshot, b: &DocumentSnapshot) -> Ordering {
        let Some(order) = &self.order_by else {
            return a.id.cmp(&b.id);
        };
        let left = a.fields.get(&order.field).filter(|v| !v.is_null());
        let right = b.fields.get(&order.field).filter(|v| !v.is_null());
        let primary = match (left, right) {
            (Some(l), Some(r)) => match order.direction {
                Direction::Ascending => l.compare(r),
                Direction::Descending => r.compare(l),
            },
            (Some(_), None) => match order.nulls {
                NullsOrder::First => Ordering::Greater,
                NullsOrder::Last => Ordering::Less,
            },
            (None, Some(_)) => match order.nulls {
                NullsOrder::First => Ordering::Less,
                NullsOrder::Last => Ordering::Greater,
            },
            (None, None) => Ordering::Equal,
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}
