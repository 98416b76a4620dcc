//! Conjunctive event filtering.
//!
//! Filters run in a fixed order (location, search, category, radius), each
//! narrowing the candidates left by the previous one. The radius filter goes
//! last since it does a table lookup and a distance computation per event.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Event;
use crate::services::geo::{Coordinates, GeoLookup};
use crate::services::store::EventStore;
use crate::utils::error::EventError;

/// Optional query parameters accepted by the listing endpoint.
///
/// Values are kept as raw strings; empty strings count as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilter {
    pub location: Option<String>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub radius: Option<String>,
}

/// How supplied-but-unparseable `lat`/`lng`/`radius` values are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoParamPolicy {
    /// Fail the query with a validation error naming the parameter.
    #[default]
    Reject,
    /// Treat the value as NaN. Every distance comparison then fails, so only
    /// events without registered coordinates survive the radius filter.
    Coerce,
}

impl FromStr for GeoParamPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "coerce" => Ok(Self::Coerce),
            other => Err(format!("unknown geo parameter policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub events: Vec<Event>,
    pub total: usize,
}

/// Radius filter parameters, present only when all three were supplied.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RadiusFilter {
    center: Coordinates,
    radius_km: f64,
}

#[derive(Debug, Clone)]
pub struct QueryEngine {
    geo: GeoLookup,
    policy: GeoParamPolicy,
}

impl QueryEngine {
    pub fn new(geo: GeoLookup, policy: GeoParamPolicy) -> Self {
        Self { geo, policy }
    }

    pub fn policy(&self) -> GeoParamPolicy {
        self.policy
    }

    /// Filters the store's current contents.
    pub fn list_events(
        &self,
        store: &EventStore,
        filter: &EventFilter,
    ) -> Result<QueryResult, EventError> {
        self.apply(store.list(), filter)
    }

    /// Narrows `events` to those matching every active filter in `filter`.
    pub fn apply(
        &self,
        events: Vec<Event>,
        filter: &EventFilter,
    ) -> Result<QueryResult, EventError> {
        // Parse up front so a bad number fails before any narrowing.
        let radius = self.radius_filter(filter)?;
        let mut events = events;

        if let Some(location) = active(&filter.location) {
            let needle = location.to_lowercase();
            events.retain(|e| e.location.to_lowercase().contains(&needle));
        }

        if let Some(search) = active(&filter.search) {
            let needle = search.to_lowercase();
            events.retain(|e| {
                e.title.to_lowercase().contains(&needle)
                    || e.description.to_lowercase().contains(&needle)
            });
        }

        if let Some(category) = active(&filter.category) {
            let wanted = category.to_lowercase();
            events.retain(|e| e.category.to_lowercase() == wanted);
        }

        if let Some(radius) = radius {
            events.retain(|e| self.within_radius(e, &radius));
        }

        debug!(total = events.len(), "Events filtered");
        let total = events.len();
        Ok(QueryResult { events, total })
    }

    /// Unknown-location inclusion policy: an event whose location has no
    /// registered coordinates cannot be measured, so it is never excluded.
    fn within_radius(&self, event: &Event, radius: &RadiusFilter) -> bool {
        match self.geo.coordinates_for(&event.location) {
            None => true,
            Some(coords) => radius.center.distance_km(&coords) <= radius.radius_km,
        }
    }

    fn radius_filter(&self, filter: &EventFilter) -> Result<Option<RadiusFilter>, EventError> {
        let (Some(lat), Some(lng), Some(radius)) = (
            active(&filter.lat),
            active(&filter.lng),
            active(&filter.radius),
        ) else {
            return Ok(None);
        };

        Ok(Some(RadiusFilter {
            center: Coordinates::new(
                self.parse_number("lat", lat)?,
                self.parse_number("lng", lng)?,
            ),
            radius_km: self.parse_number("radius", radius)?,
        }))
    }

    fn parse_number(&self, name: &'static str, raw: &str) -> Result<f64, EventError> {
        match (raw.trim().parse::<f64>(), self.policy) {
            (Ok(value), _) if value.is_finite() => Ok(value),
            (_, GeoParamPolicy::Coerce) => Ok(f64::NAN),
            (_, GeoParamPolicy::Reject) => Err(EventError::InvalidGeoParam {
                name,
                value: raw.to_string(),
            }),
        }
    }
}

impl Default for QueryEngine {
    fn default() -> Self {
        Self::new(GeoLookup::default(), GeoParamPolicy::default())
    }
}

fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventDefaults, NewEvent};
    use serde_json::json;

    fn store() -> EventStore {
        let store = EventStore::with_sample_events(EventDefaults::default());
        store
            .create(NewEvent {
                title: Some("Harbor Cleanup".into()),
                description: Some("Volunteer day at the docks".into()),
                location: Some("Jersey City, NJ".into()),
                date: Some("2024-11-30T09:00:00Z".into()),
                max_participants: Some(json!(30)),
                category: Some("Volunteering".into()),
                organizer: Some("Harbor Friends".into()),
            })
            .unwrap();
        store
    }

    fn titles(result: &QueryResult) -> Vec<&str> {
        result.events.iter().map(|e| e.title.as_str()).collect()
    }

    fn near_new_york(radius: &str) -> EventFilter {
        EventFilter {
            lat: Some("40.7128".into()),
            lng: Some("-74.0060".into()),
            radius: Some(radius.into()),
            ..Default::default()
        }
    }

    #[test]
    fn empty_filter_returns_everything_in_order() {
        let store = store();
        let result = QueryEngine::default()
            .list_events(&store, &EventFilter::default())
            .unwrap();
        assert_eq!(result.total, 4);
        assert_eq!(result.events, store.list());
    }

    #[test]
    fn search_matches_title_or_description() {
        let engine = QueryEngine::default();
        let store = store();

        let jazz = EventFilter {
            search: Some("jazz".into()),
            ..Default::default()
        };
        let result = engine.list_events(&store, &jazz).unwrap();
        assert_eq!(titles(&result), ["Jazz Night"]);
        assert_eq!(result.total, 1);

        let by_description = EventFilter {
            search: Some("ENTREPRENEURS".into()),
            ..Default::default()
        };
        let result = engine.list_events(&store, &by_description).unwrap();
        assert_eq!(titles(&result), ["Startup Networking"]);
    }

    #[test]
    fn location_is_case_insensitive_substring() {
        let filter = EventFilter {
            location: Some("new york".into()),
            ..Default::default()
        };
        let result = QueryEngine::default().list_events(&store(), &filter).unwrap();
        assert_eq!(titles(&result), ["React Workshop"]);

        let filter = EventFilter {
            location: Some(", ny".into()),
            ..Default::default()
        };
        assert_eq!(QueryEngine::default().list_events(&store(), &filter).unwrap().total, 3);
    }

    #[test]
    fn category_is_exact_but_case_insensitive() {
        let engine = QueryEngine::default();
        let music = EventFilter {
            category: Some("MUSIC".into()),
            ..Default::default()
        };
        assert_eq!(titles(&engine.list_events(&store(), &music).unwrap()), ["Jazz Night"]);

        let partial = EventFilter {
            category: Some("Mus".into()),
            ..Default::default()
        };
        assert_eq!(engine.list_events(&store(), &partial).unwrap().total, 0);
    }

    #[test]
    fn filters_combine_conjunctively() {
        let filter = EventFilter {
            location: Some("ny".into()),
            search: Some("n".into()),
            category: Some("networking".into()),
            ..Default::default()
        };
        let result = QueryEngine::default().list_events(&store(), &filter).unwrap();
        assert_eq!(titles(&result), ["Startup Networking"]);
    }

    #[test]
    fn empty_strings_are_ignored() {
        let filter = EventFilter {
            location: Some(String::new()),
            search: Some(String::new()),
            category: Some(String::new()),
            lat: Some(String::new()),
            lng: Some("-74.0".into()),
            radius: Some("1".into()),
        };
        assert_eq!(QueryEngine::default().list_events(&store(), &filter).unwrap().total, 4);
    }

    #[test]
    fn radius_includes_brooklyn_at_ten_km_and_excludes_at_five() {
        let engine = QueryEngine::default();
        let store = store();

        let wide = engine.list_events(&store, &near_new_york("10")).unwrap();
        assert!(titles(&wide).contains(&"Jazz Night"));
        // Manhattan is about 8.3 km away.
        assert!(titles(&wide).contains(&"Startup Networking"));

        let narrow = engine.list_events(&store, &near_new_york("5")).unwrap();
        assert!(!titles(&narrow).contains(&"Jazz Night"));
        assert!(titles(&narrow).contains(&"React Workshop"));
    }

    #[test]
    fn unknown_locations_survive_any_radius() {
        let engine = QueryEngine::default();
        let filter = EventFilter {
            lat: Some("-33.8688".into()),
            lng: Some("151.2093".into()),
            radius: Some("0".into()),
            ..Default::default()
        };
        let result = engine.list_events(&store(), &filter).unwrap();
        assert_eq!(titles(&result), ["Harbor Cleanup"]);
    }

    #[test]
    fn partial_geo_parameters_are_skipped() {
        let engine = QueryEngine::default();
        let filter = EventFilter {
            lat: Some("0".into()),
            radius: Some("1".into()),
            ..Default::default()
        };
        assert_eq!(engine.list_events(&store(), &filter).unwrap().total, 4);
    }

    #[test]
    fn reject_policy_fails_on_bad_numbers() {
        let engine = QueryEngine::new(GeoLookup::default(), GeoParamPolicy::Reject);
        let mut filter = near_new_york("ten");
        assert_eq!(
            engine.list_events(&store(), &filter),
            Err(EventError::InvalidGeoParam {
                name: "radius",
                value: "ten".into()
            })
        );

        filter.radius = Some("inf".into());
        assert!(engine.list_events(&store(), &filter).is_err());
    }

    #[test]
    fn coerce_policy_keeps_only_unmeasurable_events() {
        let engine = QueryEngine::new(GeoLookup::default(), GeoParamPolicy::Coerce);
        let mut filter = near_new_york("100");
        filter.lat = Some("north".into());

        let result = engine.list_events(&store(), &filter).unwrap();
        assert_eq!(titles(&result), ["Harbor Cleanup"]);
    }

    #[test]
    fn results_are_subsets_and_idempotent() {
        let engine = QueryEngine::default();
        let store = store();
        let all = store.list();
        let filters = [
            EventFilter::default(),
            near_new_york("7"),
            EventFilter {
                search: Some("a".into()),
                category: Some("music".into()),
                ..Default::default()
            },
            EventFilter {
                location: Some("brooklyn".into()),
                ..near_new_york("1")
            },
        ];

        for filter in &filters {
            let first = engine.list_events(&store, filter).unwrap();
            let second = engine.list_events(&store, filter).unwrap();
            assert_eq!(first, second);
            assert_eq!(first.total, first.events.len());
            assert!(first.events.iter().all(|e| all.contains(e)));
        }
        assert_eq!(store.list(), all);
    }

    #[test]
    fn policy_parses_from_config_strings() {
        assert_eq!("Reject".parse::<GeoParamPolicy>(), Ok(GeoParamPolicy::Reject));
        assert_eq!(" coerce ".parse::<GeoParamPolicy>(), Ok(GeoParamPolicy::Coerce));
        assert!("lenient".parse::<GeoParamPolicy>().is_err());
    }
}
