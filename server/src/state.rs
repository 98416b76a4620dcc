use std::sync::Arc;

use crate::config::Config;
use crate::models::EventDefaults;
use crate::services::{EventStore, GeoLookup, QueryEngine};

/// Shared handler state. Cloning only bumps the reference counts.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<EventStore>,
    pub engine: Arc<QueryEngine>,
}

impl AppState {
    pub fn new(store: EventStore, engine: QueryEngine) -> Self {
        Self {
            store: Arc::new(store),
            engine: Arc::new(engine),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let defaults = EventDefaults::default();
        let store = if config.seed_sample_events {
            EventStore::with_sample_events(defaults)
        } else {
            EventStore::new(defaults)
        };
        let engine = QueryEngine::new(GeoLookup::default(), config.geo_param_policy);

        Self::new(store, engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::GeoParamPolicy;

    #[test]
    fn from_config_honours_seeding_and_policy() {
        let config = Config {
            seed_sample_events: false,
            geo_param_policy: GeoParamPolicy::Coerce,
            ..Config::default()
        };
        let state = AppState::from_config(&config);
        assert!(state.store.is_empty());
        assert_eq!(state.engine.policy(), GeoParamPolicy::Coerce);

        let seeded = AppState::from_config(&Config::default());
        assert_eq!(seeded.store.len(), 3);
    }
}
