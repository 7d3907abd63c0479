//! Region grouping
//!
//! Derives region-grouped views from the flat item sequence. Groups appear in
//! order of first appearance and items keep their relative flat order, so
//! re-deriving from an unchanged sequence always yields the same view.

use std::collections::HashMap;

use crate::models::RequirementItem;
use crate::store::ItemStore;

/// A borrowed view of one region's items
#[derive(Debug, Clone, PartialEq)]
pub struct RegionGroup<'a> {
    pub name: &'a str,
    pub items: Vec<&'a RequirementItem>,
}

impl RegionGroup<'_> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Groups items by region label, preserving order of first appearance
pub fn group_by_region(items: &[RequirementItem]) -> Vec<RegionGroup<'_>> {
    let mut groups: Vec<RegionGroup<'_>> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for item in items {
        let label = item.region_label();
        match index.get(label) {
            Some(&idx) => groups[idx].items.push(item),
            None => {
                index.insert(label, groups.len());
                groups.push(RegionGroup {
                    name: label,
                    items: vec![item],
                });
            }
        }
    }

    groups
}

/// Region labels in order of first appearance
pub fn region_order(items: &[RequirementItem]) -> Vec<&str> {
    group_by_region(items).into_iter().map(|g| g.name).collect()
}

/// Items of a single region, in flat order
pub fn region_items<'a>(items: &'a [RequirementItem], region: &str) -> Vec<&'a RequirementItem> {
    items.iter().filter(|i| i.region_label() == region).collect()
}

/// An owned copy of one region's items, detached from the store
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSnapshot {
    pub name: String,
    pub items: Vec<RequirementItem>,
}

/// Memoizes the grouped view on the store's version counter
///
/// Front ends that render every frame read through this so grouping only
/// reruns after a mutation.
#[derive(Debug, Default)]
pub struct RegionViewCache {
    version: Option<u64>,
    groups: Vec<RegionSnapshot>,
}

impl RegionViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the grouped view, recomputing it if the store changed
    pub fn groups(&mut self, store: &ItemStore) -> &[RegionSnapshot] {
        if self.version != Some(store.version()) {
            self.groups = group_by_region(store.items())
                .into_iter()
                .map(|g| RegionSnapshot {
                    name: g.name.to_string(),
                    items: g.items.into_iter().cloned().collect(),
                })
                .collect();
            self.version = Some(store.version());
            log::debug!(
                "Regrouped {} items into {} regions",
                store.len(),
                self.groups.len()
            );
        }
        &self.groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNNAMED_REGION;

    fn sample() -> Vec<RequirementItem> {
        vec![
            RequirementItem::new("Nav", "Login"),
            RequirementItem::new("List", "Search"),
            RequirementItem::new("Nav", "Logout"),
        ]
    }

    fn names(group: &RegionGroup<'_>) -> Vec<String> {
        group.items.iter().map(|i| i.function_name.clone()).collect()
    }

    #[test]
    fn test_groups_by_first_appearance() {
        let items = sample();
        let groups = group_by_region(&items);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "Nav");
        assert_eq!(names(&groups[0]), vec!["Login", "Logout"]);
        assert_eq!(groups[1].name, "List");
        assert_eq!(names(&groups[1]), vec!["Search"]);
    }

    #[test]
    fn test_grouping_is_stable() {
        let items = sample();
        let first = group_by_region(&items);
        let second = group_by_region(&items);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_region_grouped_under_sentinel() {
        let mut items = sample();
        items[1].region.clear();
        let order = region_order(&items);
        assert_eq!(order, vec!["Nav", UNNAMED_REGION]);
    }

    #[test]
    fn test_empty_input() {
        assert!(group_by_region(&[]).is_empty());
    }

    #[test]
    fn test_region_items() {
        let items = sample();
        let nav = region_items(&items, "Nav");
        assert_eq!(nav.len(), 2);
        assert!(region_items(&items, "Footer").is_empty());
    }

    #[test]
    fn test_view_cache_tracks_version() {
        let mut store = ItemStore::new();
        store.replace_all(sample());
        let mut cache = RegionViewCache::new();

        assert_eq!(cache.groups(&store).len(), 2);

        store.add_item("Footer");
        let groups = cache.groups(&store);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[2].name, "Footer");
    }
}
