//! Helpers for resolving asset paths and deciding where localized files land.
//!
//! Filtering non-file references, resolving paths against their owning document,
//! expanding clip templates and computing destination paths are kept in focused
//! submodules so each can be tested on its own.

mod filters;
mod layout;
mod resolve;
mod template;

pub use filters::{remote_scheme_of, should_skip_asset_path};
pub use layout::{DestinationLayout, Placement, relative_reference};
pub use resolve::{
    AssetPathResolver, FsAssetResolver, absolute_location, normalize_inner, normalize_path,
};
pub use template::expand_clip_template;
