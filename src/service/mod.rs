//! CRUD layer: the store contract, its PostgreSQL implementation, and request validation.

mod crud;
mod validation;
pub use crud::{CrudService, EntityStore, Written};
pub use validation::RequestValidator;
