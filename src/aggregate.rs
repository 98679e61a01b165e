//! Tag frequency aggregation over a feature set.

use hashbrown::HashMap;
use serde::Serialize;

use crate::models::{FeatureSet, TagName};

/// How many features carry each tag name, ranked for display.
///
/// Ranking is by descending count with ties broken by tag name, so two
/// aggregations of the same feature set always list tags identically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFrequency {
    ranked: Vec<(TagName, usize)>,
}

impl TagFrequency {
    /// Tags with counts, most frequent first
    pub fn ranked(&self) -> &[(TagName, usize)] {
        &self.ranked
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.ranked
            .iter()
            .find(|(tag, _)| tag.as_str() == name)
            .map(|(_, count)| *count)
    }

    pub fn max_count(&self) -> usize {
        self.ranked.first().map_or(0, |(_, count)| *count)
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// Entries for the tag-list sink, with `selected` marked.
    pub fn to_tag_list(&self, selected: &TagName) -> TagList {
        let max = self.max_count().max(1) as f64;
        TagList {
            selected: selected.clone(),
            entries: self
                .ranked
                .iter()
                .map(|(tag, count)| TagListEntry {
                    tag: tag.clone(),
                    count: *count,
                    selected: tag == selected,
                    bar_fraction: *count as f64 / max,
                })
                .collect(),
        }
    }
}

/// Count, for every tag name, the number of features carrying it.
pub fn aggregate(features: &FeatureSet) -> TagFrequency {
    let mut counts: HashMap<&TagName, usize> = HashMap::new();

    // Tags keys are unique per feature, so each feature adds at most one
    for feature in features {
        for name in feature.tags.names() {
            *counts.entry(name).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(TagName, usize)> = counts
        .into_iter()
        .map(|(name, count)| (name.clone(), count))
        .collect();
    ranked.sort_by(|(a_name, a_count), (b_name, b_count)| {
        b_count.cmp(a_count).then_with(|| a_name.cmp(b_name))
    });

    TagFrequency { ranked }
}

/// One selectable row of the tag list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagListEntry {
    pub tag: TagName,
    pub count: usize,
    pub selected: bool,
    /// Bar length relative to the most frequent tag, in (0, 1]
    pub bar_fraction: f64,
}

/// What the tag-list sink renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TagList {
    pub selected: TagName,
    pub entries: Vec<TagListEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GeoFeature, GeoPoint, Tags};

    fn feature(id: i64, tags: &[(&str, &str)]) -> GeoFeature {
        GeoFeature::new(
            id,
            GeoPoint { lat: 0.0, lon: 0.0 },
            tags.iter().copied().collect::<Tags>(),
        )
    }

    fn cafes() -> FeatureSet {
        FeatureSet::new(vec![
            feature(1, &[("name", "Cafe A"), ("cuisine", "coffee")]),
            feature(2, &[("name", "Cafe B")]),
            feature(3, &[("name", "Park C"), ("leisure", "park")]),
        ])
    }

    fn names(freq: &TagFrequency) -> Vec<(&str, usize)> {
        freq.ranked()
            .iter()
            .map(|(tag, count)| (tag.as_str(), *count))
            .collect()
    }

    #[test]
    fn test_aggregate_cafes() {
        let freq = aggregate(&cafes());
        assert_eq!(
            names(&freq),
            vec![("name", 3), ("cuisine", 1), ("leisure", 1)]
        );
        assert_eq!(freq.get("cuisine"), Some(1));
        assert_eq!(freq.get("amenity"), None);
    }

    #[test]
    fn test_aggregate_empty() {
        let freq = aggregate(&FeatureSet::default());
        assert!(freq.is_empty());
        assert_eq!(freq.max_count(), 0);
    }

    #[test]
    fn test_counts_match_feature_membership() {
        let set = FeatureSet::new(vec![
            feature(1, &[("name", "A"), ("shop", "bakery"), ("opening_hours", "24/7")]),
            feature(2, &[("name", "B"), ("shop", "books")]),
            feature(3, &[("name", "C"), ("amenity", "bench")]),
            feature(4, &[("name", "D"), ("shop", "bakery"), ("amenity", "cafe")]),
        ]);
        let freq = aggregate(&set);

        for (tag, count) in freq.ranked() {
            let expected = set.iter().filter(|f| f.has_tag(tag.as_str())).count();
            assert_eq!(*count, expected, "count for {}", tag);
        }
        assert_eq!(freq.len(), 4);
        assert_eq!(
            names(&freq),
            vec![("name", 4), ("shop", 3), ("amenity", 2), ("opening_hours", 1)]
        );
    }

    #[test]
    fn test_tag_list_marks_selection() {
        let freq = aggregate(&cafes());
        let selected = TagName::new("cuisine").unwrap();
        let list = freq.to_tag_list(&selected);

        assert_eq!(list.entries.len(), 3);
        assert!(!list.entries[0].selected);
        assert!(list.entries[1].selected);
        assert_eq!(list.entries[0].bar_fraction, 1.0);
        assert!((list.entries[2].bar_fraction - 1.0 / 3.0).abs() < 1e-12);
    }
}
