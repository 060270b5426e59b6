//! Validation engine applying compiled schemas to tables.

mod collector;
mod engine;

pub use engine::ValidationEngine;
