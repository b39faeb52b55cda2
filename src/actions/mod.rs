//! Action vocabulary shared by the decision layers and the physical layers

pub mod catalog;

pub use catalog::{ActionCategory, ActionId};
