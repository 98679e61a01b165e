//! Marker filtering by the selected tag.

use crate::models::{FeatureSet, GeoFeature, Marker, TagName};

/// Features that carry `selected` as a key, in their original order.
///
/// Tag values are not inspected.
pub fn filter_features<'a, I>(features: I, selected: &TagName) -> Vec<&'a GeoFeature>
where
    I: IntoIterator<Item = &'a GeoFeature>,
{
    features
        .into_iter()
        .filter(|f| f.has_tag(selected.as_str()))
        .collect()
}

/// Marker records for every feature carrying `selected`.
pub fn markers_for(features: &FeatureSet, selected: &TagName) -> Vec<Marker> {
    filter_features(features, selected)
        .into_iter()
        .map(Marker::from_feature)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GeoPoint, Tags};

    fn feature(id: i64, tags: &[(&str, &str)]) -> GeoFeature {
        GeoFeature::new(
            id,
            GeoPoint {
                lat: id as f64,
                lon: 0.0,
            },
            tags.iter().copied().collect::<Tags>(),
        )
    }

    fn sample() -> FeatureSet {
        FeatureSet::new(vec![
            feature(1, &[("name", "Cafe A"), ("cuisine", "coffee")]),
            feature(2, &[("name", "Cafe B")]),
            feature(3, &[("name", "Park C"), ("leisure", "park")]),
            feature(4, &[("name", "Diner D"), ("cuisine", "american")]),
        ])
    }

    fn tag(name: &str) -> TagName {
        TagName::new(name).unwrap()
    }

    fn ids(features: &[&GeoFeature]) -> Vec<i64> {
        features.iter().map(|f| f.id).collect()
    }

    #[test]
    fn test_filter_keeps_order_and_matches_key() {
        let set = sample();
        let out = filter_features(&set, &tag("cuisine"));
        assert_eq!(ids(&out), vec![1, 4]);
    }

    #[test]
    fn test_filter_is_exact_subsequence() {
        let set = sample();
        for name in ["name", "cuisine", "leisure", "shop"] {
            let out = filter_features(&set, &tag(name));
            let expected: Vec<i64> = set
                .iter()
                .filter(|f| f.tags.contains(name))
                .map(|f| f.id)
                .collect();
            assert_eq!(ids(&out), expected, "filter by {}", name);
        }
    }

    #[test]
    fn test_filter_idempotent() {
        let set = sample();
        let once = filter_features(&set, &tag("cuisine"));
        let twice = filter_features(once.iter().copied(), &tag("cuisine"));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_absent_tag_yields_nothing() {
        let set = sample();
        assert!(filter_features(&set, &tag("shop")).is_empty());
        assert!(markers_for(&set, &tag("shop")).is_empty());
    }

    #[test]
    fn test_cafe_scenario_markers() {
        let set = FeatureSet::new(vec![
            feature(1, &[("name", "Cafe A"), ("cuisine", "coffee")]),
            feature(2, &[("name", "Cafe B")]),
            feature(3, &[("name", "Park C"), ("leisure", "park")]),
        ]);
        let markers = markers_for(&set, &tag("cuisine"));
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].title.as_deref(), Some("Cafe A"));
    }
}
