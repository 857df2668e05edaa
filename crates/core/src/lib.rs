//! Core decision logic for Vantage.
//!
//! This crate contains pure logic with ZERO web or database dependencies.
//! Storage is reached through the traits in [`visibility::directory`].
//!
//! # Modules
//!
//! - `visibility` - Listing policies, team hierarchy, caching and record guards

pub mod visibility;
