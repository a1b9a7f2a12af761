// Services module: business logic layer for the place store

pub mod filter;
pub mod geocode;
pub mod import;
pub mod photo;
pub mod place;
pub mod profile;
pub mod settings;
pub mod share;

// Re-export commonly used services
pub use filter::{apply_filters, category_key, PlaceFilter};
pub use geocode::{GeocoderClient, PlaceSearchResult};
pub use import::ImportService;
pub use photo::{HttpObjectStore, ObjectStore};
pub use place::PlaceService;
pub use profile::ProfileService;
pub use settings::{SettingsService, UiPreferences};
pub use share::ShareService;
