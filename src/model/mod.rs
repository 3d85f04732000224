//! Work-item data model
//!
//! This module contains:
//! - [`CrawlURI`], the frontier's unit of work
//! - [`FetchStatus`] attempt outcomes
//! - Hop types and scheduling directives
//! - The attribute bag and its heritable/persistent key registry

mod attributes;
mod crawl_uri;
mod fetch_status;
mod hop;

pub use attributes::{AttributeBag, AttributeRegistry};
pub use crawl_uri::{CrawlURI, DiscoveredLink};
pub use fetch_status::FetchStatus;
pub use hop::{Hop, SchedulingDirective};
