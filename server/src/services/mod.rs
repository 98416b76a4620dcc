pub mod geo;
pub mod query;
pub mod store;

pub use geo::{Coordinates, GeoLookup};
pub use query::{EventFilter, GeoParamPolicy, QueryEngine, QueryResult};
pub use store::EventStore;
