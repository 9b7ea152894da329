//! Merged customer trees.

pub mod builder;

pub use builder::TreeBuilder;
