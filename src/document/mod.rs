//! Scene documents: the data model, its encodings, package containers and the store
//! the localizer reads and writes through.

mod codec;
mod model;
mod package;
mod store;

pub use codec::DocumentFormat;
pub use model::{ClipSet, Prim, Property, SceneDocument};
pub use package::{read_package_entry, read_package_root};
pub use store::{Document, DocumentStore, FsDocumentStore};
