// Sight Map - Core Library
// Selection controller and its collaborators, shared by the viewer and the dataset server

pub mod config;
pub mod controller;
pub mod geo;
pub mod logging;
pub mod map;
pub mod record;
pub mod source;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use controller::{SelectOrigin, SelectionSyncController, BALLOON_SEPARATOR, DEFAULT_PAGE_SIZE};
pub use geo::{
    locate, FixedLocation, GeoError, GeoOptions, HttpLocation, LocationProvider,
    Unsupported,
};
pub use map::{
    open_set, sync_balloons, Bounds, CellArea, CenterOptions, MapHandle, Marker, MarkerKind,
    TerminalMap,
};
pub use record::{LatLng, PlaceType, Record, RecordId, PLACE_TYPES};
pub use source::{
    load_records, source_for, FetchError, FileSource, HttpSource, RecordSource, DEFAULT_ENDPOINT,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
