use std::collections::{HashMap, HashSet};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ItemField, RequirementItem};

/// Errors raised by store mutations that can be misused by a caller
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Region not found: {0}")]
    UnknownRegion(String),

    #[error("Invalid reorder for region '{region}': {reason}")]
    InvalidPermutation { region: String, reason: String },
}

/// The flat, ordered sequence of requirement items
///
/// This is the only source of truth; per-region views are derived from it
/// (see [`crate::grouping`]). Every mutation bumps `version` so derived views
/// can be memoized.
#[derive(Debug, Default, Clone)]
pub struct ItemStore {
    items: Vec<RequirementItem>,
    version: u64,
}

impl ItemStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// All items in flat order
    pub fn items(&self) -> &[RequirementItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Monotonic mutation counter
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Gets an item by ID
    pub fn get(&self, id: &Uuid) -> Option<&RequirementItem> {
        self.items.iter().find(|i| i.id == *id)
    }

    fn touch(&mut self) {
        self.version += 1;
    }

    /// Discards the current collection and installs `items`
    pub fn replace_all(&mut self, items: Vec<RequirementItem>) {
        log::debug!("Replacing {} items with {}", self.items.len(), items.len());
        self.items = items;
        self.touch();
    }

    /// Removes every item
    pub fn clear(&mut self) {
        self.replace_all(Vec::new());
    }

    /// Sets one text field on the item with `id`
    ///
    /// Returns false (and leaves the store untouched) when no item matches.
    pub fn update_field(&mut self, id: &Uuid, field: ItemField, value: impl Into<String>) -> bool {
        let Some(item) = self.items.iter_mut().find(|i| i.id == *id) else {
            return false;
        };
        *item.field_mut(field) = value.into();
        self.touch();
        true
    }

    /// Removes the item with `id`, returning it if present
    pub fn delete_item(&mut self, id: &Uuid) -> Option<RequirementItem> {
        let pos = self.items.iter().position(|i| i.id == *id)?;
        let removed = self.items.remove(pos);
        self.touch();
        Some(removed)
    }

    /// Appends an empty item tagged with `region` and returns its ID
    pub fn add_item(&mut self, region: &str) -> Uuid {
        let item = RequirementItem::blank(region);
        let id = item.id;
        self.items.push(item);
        self.touch();
        id
    }

    /// Moves every item of `old_region` to `new_region`, keeping positions
    ///
    /// Returns the number of items relabelled.
    pub fn rename_region(&mut self, old_region: &str, new_region: &str) -> usize {
        if old_region == new_region {
            return 0;
        }

        let mut renamed = 0;
        for item in &mut self.items {
            if item.region_label() == old_region {
                item.region = new_region.to_string();
                renamed += 1;
            }
        }

        if renamed > 0 {
            log::debug!(
                "Renamed region '{}' to '{}' ({} items)",
                old_region,
                new_region,
                renamed
            );
            self.touch();
        }
        renamed
    }

    /// Replaces the order of `region`'s items with `new_order`
    ///
    /// `new_order` must be a permutation of the region's current item IDs.
    /// Every other region keeps its items, their order and its position in
    /// the region order. On error the store is left untouched.
    pub fn reorder_region(&mut self, region: &str, new_order: &[Uuid]) -> Result<(), StoreError> {
        self.validate_permutation(region, new_order)?;

        // Partition into regions by first appearance
        let mut buckets: Vec<(String, Vec<RequirementItem>)> = Vec::new();
        let mut bucket_index: HashMap<String, usize> = HashMap::new();
        for item in std::mem::take(&mut self.items) {
            let label = item.region_label().to_string();
            match bucket_index.get(&label) {
                Some(&idx) => buckets[idx].1.push(item),
                None => {
                    bucket_index.insert(label.clone(), buckets.len());
                    buckets.push((label, vec![item]));
                }
            }
        }

        let mut rebuilt = Vec::with_capacity(buckets.iter().map(|(_, b)| b.len()).sum());
        for (label, bucket) in buckets {
            if label == region {
                let mut by_id: HashMap<Uuid, RequirementItem> =
                    bucket.into_iter().map(|i| (i.id, i)).collect();
                rebuilt.extend(new_order.iter().filter_map(|id| by_id.remove(id)));
            } else {
                rebuilt.extend(bucket);
            }
        }

        self.items = rebuilt;
        self.touch();
        Ok(())
    }

    fn validate_permutation(&self, region: &str, new_order: &[Uuid]) -> Result<(), StoreError> {
        let current: HashSet<Uuid> = self
            .items
            .iter()
            .filter(|i| i.region_label() == region)
            .map(|i| i.id)
            .collect();

        if current.is_empty() {
            return Err(StoreError::UnknownRegion(region.to_string()));
        }

        let invalid = |reason: String| {
            log::warn!("Rejected reorder of region '{}': {}", region, reason);
            StoreError::InvalidPermutation {
                region: region.to_string(),
                reason,
            }
        };

        if new_order.len() != current.len() {
            return Err(invalid(format!(
                "expected {} items, got {}",
                current.len(),
                new_order.len()
            )));
        }

        let mut seen = HashSet::with_capacity(new_order.len());
        for id in new_order {
            if !current.contains(id) {
                return Err(invalid(format!("item {} is not in this region", id)));
            }
            if !seen.insert(*id) {
                return Err(invalid(format!("item {} appears more than once", id)));
            }
        }

        Ok(())
    }
}
