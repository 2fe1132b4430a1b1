pub mod app_settings;
pub mod country;
pub mod identity;
pub mod persistence;
pub mod store;
pub mod trip;

pub use app_settings::AppSettings;
pub use country::Country;
pub use identity::{Identity, LocalIdentity};
pub use persistence::Persistable;
pub use store::{FileTripStore, StoreError, Subscription, TripPatch, TripStore};
pub use trip::{Trip, TripData};
