//! Test data

mod fixtures;

pub use fixtures::{ForestConfig, TestDataFactory};
