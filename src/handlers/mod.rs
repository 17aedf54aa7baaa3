//! HTTP handlers for entity CRUD and the API document.

pub mod entity;
pub mod docs;
pub use entity::*;
pub use docs::*;
