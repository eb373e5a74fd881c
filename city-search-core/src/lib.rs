//! Core library for the `city-search` autocomplete.
//!
//! This crate defines:
//! - The option model handed to a searchable dropdown
//! - Loading options from the city-lookup service
//! - Debounced, cancellable search sessions
//! - The search widget that owns the selected city
//! - Configuration & credentials handling
//!
//! It is used by `city-search-cli`, but the widget only depends on the
//! [`OptionLoader`] contract, so any front end can drive it.

pub mod config;
pub mod error;
pub mod loader;
pub mod model;
pub mod session;
pub mod widget;

pub use config::{Config, GeoApiConfig};
pub use error::{CoordinatesError, ErrorKind, LoadError};
pub use loader::{GeoDbCityLoader, OptionLoader};
pub use model::{Coordinates, OptionPage, SelectableOption};
pub use session::{SearchSession, SearchUpdate};
pub use widget::{DEBOUNCE_TIMEOUT, OptionsState, PLACEHOLDER, SearchWidget};
