//! # component-id - Wire identifiers for interactive components
//!
//! Encodes and decodes the compact identifier string carried by buttons,
//! select menus and modals:
//!
//! ```text
//! [routing]:[component]:[identity]:[payload...]
//!
//!   sc:btn:confirm-delete:123   stateless button, payload "123"
//!   cb:btn:a1b2c3d4             callback button
//!   cb:mdl:f7e8d9c0:user:456    callback modal, payload "user:456"
//! ```
//!
//! The wire form is limited to 100 characters; [`ComponentId::encode`] is the
//! only place that limit is checked.

pub mod component_id;
pub mod error;

pub use component_id::{
    ComponentId, ComponentKind, DELIMITER, MAX_ID_LENGTH, RoutingKind, split_segments,
};
pub use error::{IdError, IdResult};
