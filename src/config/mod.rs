//! Configuration for crawl sessions
//!
//! This module provides the `CrawlConfig` struct, its fluent builder and the
//! validation shared by builder and JSON loading.

pub mod builder;
pub mod getters;
pub mod types;
pub mod validation;

pub use builder::CrawlConfigBuilder;
pub use types::{CrawlConfig, ExtractionRules};
