#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod asset_paths;
pub mod config;
pub mod document;
pub mod error;
pub mod localize;
pub mod models;
pub mod selection;

pub use config::LocalizeConfig;
pub use error::{DocumentError, LocalizeError, LocalizeResult};
pub use localize::{
    DependencyProcessor, LocalizeSummary, Localizer, localize, localize_with_config,
};
pub use models::{DependencyInfo, Location, OwningDocument};
pub use selection::{DependencySelection, StripPrefix};
