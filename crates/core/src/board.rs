//! Partitioning of current records into a student's category buckets.

use std::collections::HashMap;

use serde::Serialize;

use crate::derive::CurrentView;
use crate::model::{Category, CategoryId, ProgressRecord};

/// Anything that carries an optional category reference.
pub trait Categorized {
    fn category_id(&self) -> Option<CategoryId>;
}

impl Categorized for ProgressRecord {
    fn category_id(&self) -> Option<CategoryId> {
        ProgressRecord::category_id(self)
    }
}

impl Categorized for CurrentView {
    fn category_id(&self) -> Option<CategoryId> {
        self.record.category_id()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum BucketKey {
    Uncategorized,
    Category(CategoryId),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket<T> {
    pub key: BucketKey,
    /// `None` for the uncategorized bucket.
    pub category: Option<Category>,
    pub items: Vec<T>,
}

/// Current records grouped for display: the uncategorized bucket first, then
/// one bucket per category in the order the categories were given (empty
/// categories included).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Board<T> {
    buckets: Vec<Bucket<T>>,
}

impl<T> Board<T> {
    #[must_use]
    pub fn buckets(&self) -> &[Bucket<T>] {
        &self.buckets
    }

    #[must_use]
    pub fn bucket(&self, key: BucketKey) -> Option<&Bucket<T>> {
        self.buckets.iter().find(|bucket| bucket.key == key)
    }

    #[must_use]
    pub fn uncategorized(&self) -> &[T] {
        self.bucket(BucketKey::Uncategorized)
            .map_or(&[], |bucket| bucket.items.as_slice())
    }

    /// Total number of items across all buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.items.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maps items while keeping the bucket layout.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Board<U> {
        Board {
            buckets: self
                .buckets
                .into_iter()
                .map(|bucket| Bucket {
                    key: bucket.key,
                    category: bucket.category,
                    items: bucket.items.into_iter().map(&mut f).collect(),
                })
                .collect(),
        }
    }
}

/// Puts every item in exactly one bucket: its category when that category is
/// in `categories`, otherwise the uncategorized bucket.
#[must_use]
pub fn partition<T: Categorized>(items: Vec<T>, categories: &[Category]) -> Board<T> {
    let mut buckets = Vec::with_capacity(categories.len() + 1);
    buckets.push(Bucket {
        key: BucketKey::Uncategorized,
        category: None,
        items: Vec::new(),
    });

    let mut slot_of: HashMap<CategoryId, usize> = HashMap::with_capacity(categories.len());
    for category in categories {
        if slot_of.contains_key(&category.id()) {
            continue;
        }
        slot_of.insert(category.id(), buckets.len());
        buckets.push(Bucket {
            key: BucketKey::Category(category.id()),
            category: Some(category.clone()),
            items: Vec::new(),
        });
    }

    for item in items {
        let slot = item
            .category_id()
            .and_then(|id| slot_of.get(&id).copied())
            .unwrap_or(0);
        buckets[slot].items.push(item);
    }

    Board { buckets }
}
