//! Data module - CSV loading, normalization and filtering

pub mod filter;
pub mod loader;
pub mod schema;

pub use loader::{DataCache, LoaderError};
pub use schema::{Operator, Rgb};
