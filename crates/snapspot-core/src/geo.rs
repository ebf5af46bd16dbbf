use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lng: f64,
}

impl Point {
    pub fn new(lat: f64, lng: f64) -> Self {
        Point { lat, lng }
    }

    /// NaN or infinite coordinates count as missing for filtering purposes.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Great circle distance in kilometers (haversine formula).
pub fn haversine_km(from: Point, to: Point) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Facts the filter needs about a spot. Implemented by the DAL models, which
/// keeps this crate independent of storage.
pub trait SpotFacts {
    fn coordinates(&self) -> Option<Point>;
    fn category_ids(&self) -> &[i64];
    fn name(&self) -> &str;
    fn description(&self) -> Option<&str>;
    fn address(&self) -> Option<&str>;
}

/// Browsing criteria - ephemeral, lives only for one listing request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpotFilter {
    pub center: Option<Point>,
    pub radius_km: Option<f64>,
    pub category_ids: Vec<i64>,
    pub text: Option<String>,
}

impl SpotFilter {
    pub fn is_empty(&self) -> bool {
        self.distance_bound().is_none()
            && self.category_ids.is_empty()
            && normalized(self.text.as_deref()).is_none()
    }

    /// Distance stage applies only with a usable center and a radius.
    fn distance_bound(&self) -> Option<(Point, f64)> {
        match (self.center, self.radius_km) {
            (Some(center), Some(radius)) if center.is_valid() => Some((center, radius)),
            _ => None,
        }
    }
}

fn normalized(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

/// Filters spots by distance AND categories AND text; each stage is an OR over
/// its own alternatives. Empty criteria keep everything, in input order. Never
/// mutates the input; a spot without coordinates fails the distance stage
/// silently whenever that stage is active.
pub fn filter_spots<'a, T>(spots: &'a [T], criteria: &SpotFilter) -> Vec<&'a T>
where
    T: SpotFacts,
{
    let bound = criteria.distance_bound();
    let text = normalized(criteria.text.as_deref()).map(|t| t.to_lowercase());
    spots
        .iter()
        .filter(|spot| within_distance(*spot, bound))
        .filter(|spot| matches_categories(*spot, &criteria.category_ids))
        .filter(|spot| matches_text(*spot, text.as_deref()))
        .collect()
}

fn within_distance<T: SpotFacts>(spot: &T, bound: Option<(Point, f64)>) -> bool {
    let Some((center, radius)) = bound else {
        return true;
    };
    match spot.coordinates() {
        Some(location) if location.is_valid() => haversine_km(center, location) <= radius,
        _ => false,
    }
}

fn matches_categories<T: SpotFacts>(spot: &T, wanted: &[i64]) -> bool {
    if wanted.is_empty() {
        return true;
    }
    spot.category_ids().iter().any(|id| wanted.contains(id))
}

fn matches_text<T: SpotFacts>(spot: &T, needle: Option<&str>) -> bool {
    let Some(needle) = needle else {
        return true;
    };
    let contains = |field: &str| field.to_lowercase().contains(needle);
    contains(spot.name())
        || spot.description().is_some_and(contains)
        || spot.address().is_some_and(contains)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct TestSpot {
        id: i64,
        name: String,
        description: Option<String>,
        address: Option<String>,
        location: Option<Point>,
        categories: Vec<i64>,
    }

    impl SpotFacts for TestSpot {
        fn coordinates(&self) -> Option<Point> {
            self.location
        }

        fn category_ids(&self) -> &[i64] {
            &self.categories
        }

        fn name(&self) -> &str {
            &self.name
        }

        fn description(&self) -> Option<&str> {
            self.description.as_deref()
        }

        fn address(&self) -> Option<&str> {
            self.address.as_deref()
        }
    }

    fn spot(id: i64, location: Option<(f64, f64)>, categories: &[i64]) -> TestSpot {
        TestSpot {
            id,
            name: format!("Spot {id}"),
            description: None,
            address: None,
            location: location.map(|(lat, lng)| Point::new(lat, lng)),
            categories: categories.to_vec(),
        }
    }

    fn golden_gate() -> TestSpot {
        TestSpot {
            id: 1,
            name: "Golden Gate Bridge".to_string(),
            description: Some("Iconic suspension bridge with bay views".to_string()),
            address: Some("Golden Gate Bridge, San Francisco, CA".to_string()),
            location: Some(Point::new(37.8199, -122.4783)),
            categories: vec![1, 2],
        }
    }

    fn brooklyn_bridge() -> TestSpot {
        TestSpot {
            id: 2,
            name: "Brooklyn Bridge".to_string(),
            description: None,
            address: Some("Brooklyn Bridge, New York, NY".to_string()),
            location: Some(Point::new(40.7061, -73.9969)),
            categories: vec![3],
        }
    }

    fn ids(filtered: &[&TestSpot]) -> Vec<i64> {
        filtered.iter().map(|s| s.id).collect()
    }

    #[test]
    fn test_haversine_known_distance() {
        // San Francisco downtown to Golden Gate Bridge is roughly 7.7 km
        let sf = Point::new(37.77, -122.43);
        let bridge = Point::new(37.8199, -122.4783);
        let distance = haversine_km(sf, bridge);
        assert!((6.0..9.0).contains(&distance), "got {distance}");

        let same = haversine_km(bridge, bridge);
        assert_eq!(same, 0.0);
    }

    #[test]
    fn test_empty_criteria_keeps_all_in_order() {
        let spots = vec![
            spot(1, Some((1.0, 1.0)), &[1]),
            spot(2, None, &[]),
            spot(3, Some((2.0, 2.0)), &[2]),
        ];
        let filtered = filter_spots(&spots, &SpotFilter::default());
        assert_eq!(ids(&filtered), vec![1, 2, 3]);
    }

    #[test]
    fn test_distance_stage_skipped_without_center() {
        let spots = vec![spot(1, None, &[]), spot(2, Some((50.0, 50.0)), &[])];
        // radius alone does not activate the distance stage
        let criteria = SpotFilter {
            radius_km: Some(1.0),
            ..Default::default()
        };
        assert_eq!(ids(&filter_spots(&spots, &criteria)), vec![1, 2]);

        // NaN center coordinate also skips the distance stage
        let criteria = SpotFilter {
            center: Some(Point::new(f64::NAN, 10.0)),
            radius_km: Some(1.0),
            ..Default::default()
        };
        assert_eq!(ids(&filter_spots(&spots, &criteria)), vec![1, 2]);
    }

    #[test]
    fn test_zero_radius_keeps_coincident_point() {
        let here = (37.8199, -122.4783);
        let spots = vec![spot(1, Some(here), &[]), spot(2, Some((37.82, -122.48)), &[])];
        let criteria = SpotFilter {
            center: Some(Point::new(here.0, here.1)),
            radius_km: Some(0.0),
            ..Default::default()
        };
        assert_eq!(ids(&filter_spots(&spots, &criteria)), vec![1]);
    }

    #[test]
    fn test_missing_coordinates_fail_distance_stage() {
        let spots = vec![
            spot(1, None, &[]),
            spot(2, Some((f64::NAN, 0.0)), &[]),
            spot(3, Some((0.0, 0.0)), &[]),
        ];
        // huge radius still cannot admit spots without a usable location
        let criteria = SpotFilter {
            center: Some(Point::new(0.0, 0.0)),
            radius_km: Some(1.0e9),
            ..Default::default()
        };
        assert_eq!(ids(&filter_spots(&spots, &criteria)), vec![3]);

        let criteria = SpotFilter {
            center: Some(Point::new(0.0, 0.0)),
            radius_km: Some(-1.0),
            ..Default::default()
        };
        assert!(filter_spots(&spots, &criteria).is_empty());
    }

    #[test]
    fn test_category_filter_is_or_within_stage() {
        let spots = vec![
            spot(1, None, &[1, 2]),
            spot(2, None, &[3]),
            spot(3, None, &[]),
        ];
        let criteria = SpotFilter {
            category_ids: vec![2, 3],
            ..Default::default()
        };
        // spots matching any selected category pass, uncategorized ones do not
        assert_eq!(ids(&filter_spots(&spots, &criteria)), vec![1, 2]);
    }

    #[test]
    fn test_text_matches_any_field_case_insensitive() {
        let spots = vec![golden_gate(), brooklyn_bridge()];
        for needle in ["golden", "BAY VIEWS", "san francisco"] {
            let criteria = SpotFilter {
                text: Some(needle.to_string()),
                ..Default::default()
            };
            assert_eq!(ids(&filter_spots(&spots, &criteria)), vec![1], "{needle}");
        }
        // both are bridges by name
        let criteria = SpotFilter {
            text: Some("bridge".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_spots(&spots, &criteria)), vec![1, 2]);

        // whitespace-only text does not filter
        let criteria = SpotFilter {
            text: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(filter_spots(&spots, &criteria).len(), 2);
    }

    #[test]
    fn test_stages_compose_and_commute() {
        let spots = vec![golden_gate(), brooklyn_bridge()];
        let by_category = SpotFilter {
            category_ids: vec![1],
            ..Default::default()
        };
        let by_distance = SpotFilter {
            center: Some(Point::new(37.77, -122.43)),
            radius_km: Some(50.0),
            ..Default::default()
        };
        let combined = SpotFilter {
            center: by_distance.center,
            radius_km: by_distance.radius_km,
            category_ids: by_category.category_ids.clone(),
            text: None,
        };

        let category_first: Vec<TestSpot> =
            filter_spots(&spots, &by_category).into_iter().cloned().collect();
        let staged = ids(&filter_spots(&category_first, &by_distance));
        let at_once = ids(&filter_spots(&spots, &combined));
        assert_eq!(staged, at_once);
        assert_eq!(at_once, vec![1]);
    }

    #[test]
    fn test_concrete_scenario_from_home_listing() {
        // center in San Francisco, 50 km radius, category 1 selected
        let spots = vec![golden_gate(), brooklyn_bridge()];
        let criteria = SpotFilter {
            center: Some(Point::new(37.77, -122.43)),
            radius_km: Some(50.0),
            category_ids: vec![1],
            text: None,
        };
        let filtered = filter_spots(&spots, &criteria);
        assert_eq!(ids(&filtered), vec![1]);
    }

    #[test]
    fn test_filter_criteria_deserialization() {
        let criteria: SpotFilter = serde_json::from_str(
            r#"{"center":{"lat":37.77,"lng":-122.43},"radius_km":50.0,"category_ids":[1],"text":null}"#,
        )
        .unwrap();
        assert!(!criteria.is_empty());
        assert_eq!(criteria.category_ids, vec![1]);
    }
}
