#![forbid(unsafe_code)]

//! Core: typed form paths, collection records, and collaborator contracts.
//!
//! # Role in fitform
//! `fitform-core` is the leaf layer. It defines how a location in the form
//! tree is named ([`CollectionPath`]), what a record looks like
//! ([`CollectionItem`]), and the two external collaborators the editor talks
//! to: the [`FormDataStore`] holding the form tree and the async
//! [`Validator`]. The state machines live in `fitform-editor`.

pub mod error;
pub mod item;
pub mod logging;
pub mod path;
pub mod store;
pub mod validate;

pub use error::{StoreError, StoreResult};
pub use item::{CollectionItem, ID_FIELD};
pub use path::{CollectionPath, PathSegment};
pub use store::{FormDataStore, JsonFormStore};
pub use validate::{AcceptAll, FieldError, FnValidator, Validator};
