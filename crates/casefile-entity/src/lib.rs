//! # casefile-entity
//!
//! Domain entity models for Casefile. Database entities derive
//! `sqlx::FromRow`; folders and notes have no table and are modeled as
//! path-identified value types.

pub mod customer;
pub mod document;
pub mod folder;
pub mod note;
pub mod tree;
