//! CSS selectors from configuration and replay files, compiled with `scraper`.

use scraper::Selector;

use crate::error::ObserverError;

pub fn parse_selector(source: &str) -> Result<Selector, ObserverError> {
    Selector::parse(source).map_err(|e| ObserverError::selector(source, format!("{:?}", e)))
}

/// Compile every selector, failing on the first invalid one.
pub fn parse_selectors(sources: &[String]) -> Result<Vec<Selector>, ObserverError> {
    sources.iter().map(|s| parse_selector(s)).collect()
}
