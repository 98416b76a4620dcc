//! In-memory event storage.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tracing::{debug, info};

use crate::models::event::parse_event_date;
use crate::models::{Event, EventDefaults, EventId, NewEvent};
use crate::utils::error::EventError;

#[derive(Debug)]
struct Inner {
    events: Vec<Event>,
    next_id: i64,
}

/// Authoritative, append-ordered collection of events.
///
/// Built once at start-up and shared behind an `Arc`. Reads clone a snapshot
/// under the shared lock; `create` takes the write lock for the whole
/// id-assignment and append so two concurrent creations never see the same id.
#[derive(Debug)]
pub struct EventStore {
    inner: RwLock<Inner>,
    defaults: EventDefaults,
}

impl EventStore {
    pub fn new(defaults: EventDefaults) -> Self {
        Self {
            inner: RwLock::new(Inner {
                events: Vec::new(),
                next_id: 1,
            }),
            defaults,
        }
    }

    /// Store pre-populated with a few demo events.
    pub fn with_sample_events(defaults: EventDefaults) -> Self {
        let store = Self::new(defaults);
        {
            let mut inner = store.write();
            let created_at = Utc::now();
            for sample in SAMPLE_EVENTS {
                let id = EventId(inner.next_id);
                inner.next_id += 1;
                inner.events.push(Event {
                    id,
                    title: sample.title.to_string(),
                    description: sample.description.to_string(),
                    location: sample.location.to_string(),
                    // Literals below are well-formed RFC 3339.
                    date: parse_event_date(sample.date).unwrap_or(created_at),
                    max_participants: sample.max_participants,
                    current_participants: sample.current_participants,
                    category: sample.category.to_string(),
                    organizer: sample.organizer.to_string(),
                    created_at,
                });
            }
            info!(count = inner.events.len(), "Seeded sample events");
        }
        store
    }

    /// Snapshot of every event in insertion order.
    pub fn list(&self) -> Vec<Event> {
        self.read().events.clone()
    }

    pub fn get(&self, id: EventId) -> Result<Event, EventError> {
        self.read()
            .events
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(EventError::NotFound(id))
    }

    /// Validates `fields` and appends the resulting event.
    ///
    /// Validation happens before the lock is taken, so a rejected request
    /// leaves both the events and the id counter untouched.
    pub fn create(&self, fields: NewEvent) -> Result<Event, EventError> {
        let valid = fields.validate(&self.defaults)?;

        let mut inner = self.write();
        let id = EventId(inner.next_id);
        inner.next_id += 1;

        let event = Event {
            id,
            title: valid.title,
            description: valid.description,
            location: valid.location,
            date: valid.date,
            max_participants: valid.max_participants,
            current_participants: 0,
            category: valid.category,
            organizer: valid.organizer,
            created_at: Utc::now(),
        };
        inner.events.push(event.clone());

        debug!(id = %event.id, title = %event.title, "Event stored");
        Ok(event)
    }

    pub fn len(&self) -> usize {
        self.read().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding the lock cannot leave `Inner` half-updated: the
    // counter bump and push are the only mutations.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new(EventDefaults::default())
    }
}

struct SampleEvent {
    title: &'static str,
    description: &'static str,
    location: &'static str,
    date: &'static str,
    max_participants: u32,
    current_participants: u32,
    category: &'static str,
    organizer: &'static str,
}

const SAMPLE_EVENTS: [SampleEvent; 3] = [
    SampleEvent {
        title: "React Workshop",
        description: "Learn React fundamentals with hands-on projects",
        location: "New York, NY",
        date: "2024-11-15T18:00:00Z",
        max_participants: 50,
        current_participants: 23,
        category: "Workshop",
        organizer: "Tech Community",
    },
    SampleEvent {
        title: "Jazz Night",
        description: "Live jazz performance featuring local artists",
        location: "Brooklyn, NY",
        date: "2024-11-12T20:00:00Z",
        max_participants: 100,
        current_participants: 45,
        category: "Music",
        organizer: "Brooklyn Arts",
    },
    SampleEvent {
        title: "Startup Networking",
        description: "Connect with entrepreneurs and investors",
        location: "Manhattan, NY",
        date: "2024-11-20T17:00:00Z",
        max_participants: 80,
        current_participants: 62,
        category: "Networking",
        organizer: "NYC Startups",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use serde_json::json;
    use std::sync::Arc;

    fn new_event(title: &str) -> NewEvent {
        NewEvent {
            title: Some(title.into()),
            description: Some("An evening of talks".into()),
            location: Some("Queens, NY".into()),
            date: Some("2025-03-01T18:00:00Z".into()),
            max_participants: Some(json!(25)),
            category: Some("Tech".into()),
            organizer: None,
        }
    }

    #[test]
    fn sample_store_holds_three_events_in_order() {
        let store = EventStore::with_sample_events(EventDefaults::default());
        let titles: Vec<_> = store.list().into_iter().map(|e| e.title).collect();
        assert_eq!(titles, ["React Workshop", "Jazz Night", "Startup Networking"]);
    }

    #[test]
    fn create_assigns_increasing_ids_after_seeds() {
        let store = EventStore::with_sample_events(EventDefaults::default());
        let max_seed = store.list().iter().map(|e| e.id).max().unwrap();

        let first = store.create(new_event("First")).unwrap();
        let second = store.create(new_event("Second")).unwrap();

        assert!(first.id > max_seed);
        assert!(second.id > first.id);
        assert_eq!(first.current_participants, 0);
        assert_eq!(first.organizer, "Anonymous");
        assert_eq!(store.len(), 5);
        assert_eq!(store.list().last().map(|e| e.id), Some(second.id));
    }

    #[test]
    fn created_timestamps_are_iso8601() {
        let store = EventStore::default();
        let event = store.create(new_event("Talk")).unwrap();

        let value = serde_json::to_value(&event).unwrap();
        for key in ["date", "createdAt"] {
            let raw = value[key].as_str().unwrap();
            assert!(DateTime::parse_from_rfc3339(raw).is_ok(), "{key}: {raw}");
            assert!(raw.ends_with('Z'));
        }
    }

    #[test]
    fn invalid_create_leaves_store_unchanged() {
        let store = EventStore::with_sample_events(EventDefaults::default());
        let before = store.list();

        let mut missing = new_event("Broken");
        missing.description = Some(String::new());
        assert_eq!(
            store.create(missing),
            Err(EventError::MissingFields(vec!["description"]))
        );

        let mut bad_date = new_event("Broken");
        bad_date.date = Some("not a date".into());
        assert!(matches!(store.create(bad_date), Err(EventError::InvalidDate(_))));

        assert_eq!(store.list(), before);

        // The counter did not move either.
        let next = store.create(new_event("Fine")).unwrap();
        assert_eq!(next.id, EventId(4));
    }

    #[test]
    fn get_returns_stored_record_or_not_found() {
        let store = EventStore::default();
        let created = store.create(new_event("Lookup")).unwrap();

        assert_eq!(store.get(created.id), Ok(created));
        assert_eq!(store.get(EventId(999)), Err(EventError::NotFound(EventId(999))));
    }

    #[test]
    fn concurrent_creates_never_share_an_id() {
        let store = Arc::new(EventStore::default());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    (0..25)
                        .map(|i| store.create(new_event(&format!("t{t}-{i}"))).unwrap().id)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<EventId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 200);
        assert_eq!(store.len(), 200);
    }
}
