//! URL handling module for Seoscope
//!
//! This module provides URL normalization, domain extraction, and the
//! inclusion/exclusion filter applied to candidate URLs.

mod domain;
mod filter;
mod normalize;

pub use domain::{crawling_id_for, extract_domain};
pub use filter::UrlFilter;
pub use normalize::{normalize_url, seen_key};
