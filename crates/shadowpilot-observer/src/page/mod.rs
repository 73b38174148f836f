//! Page model standing in for the host DOM, backed by `scraper`.

mod document;
mod selector;

pub use document::{collapse_whitespace, ElementSpec, NodeId, PageDocument, PageSnapshot, Sibling};
pub use scraper::Selector;
pub use selector::{parse_selector, parse_selectors};
