//! # ShadowPilot Observer
//!
//! Reads a parsed page and turns DOM events into raw signals:
//! field focus with a resolved label and value, button clicks classified
//! against the action vocabulary, connector hints, page header and
//! connector guesses after navigation, and sanitized content snippets.
//!
//! The observer is stateless. Debounce, dedup and session memory live in
//! `shadowpilot-intent`.

mod error;
mod label;
mod observer;
pub mod page;
mod signal;
mod snippet;

pub use error::ObserverError;
pub use observer::{truncate_chars, ClickAction, PageObserver};
pub use page::{
    parse_selector, ElementSpec, NodeId, PageDocument, PageSnapshot, Selector, Sibling,
};
pub use signal::{RawSignal, SignalKind};
