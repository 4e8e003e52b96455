// src/services/mod.rs

pub mod store;        // the only place that talks SQL
pub mod keys;
pub mod mirror;
pub mod resolver;
pub mod repository;   // every mutation goes through here
pub mod edit;
pub mod geo;
pub mod scan;
pub mod signal;

// Public API
pub use edit::{edit_mirror, EditOutcome, Editor, ExternalEditor};
pub use geo::{GeoLocator, GeoLookup, TableGeoLocator};
pub use mirror::MirrorRecord;
pub use repository::{ExportFormat, ExportOptions, ListFilter, Repository};
pub use scan::{DaemonScanner, Scanner};
pub use signal::{ControlSignal, PidFile};
pub use store::Store;
