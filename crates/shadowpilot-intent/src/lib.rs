//! # ShadowPilot Intent
//!
//! Intent classification and deduplication, split across the two execution
//! contexts:
//!
//! - [`IntentClassifier`] runs in the page context. It debounces field focus,
//!   applies the focus and intent cooldowns, resolves connectors, drops
//!   fields of locked dynamic classes and gates navigation-derived context
//!   updates.
//! - [`AdviceRouter`] runs in the panel context. It decides whether an intent
//!   reuses an earlier answer, is ignored, or needs a backend call.
//!
//! Both own a [`SessionContext`]; nothing is shared between them.

mod classifier;
mod debounce;
mod dynamic;
mod router;
mod session;

pub use classifier::IntentClassifier;
pub use debounce::Debounce;
pub use dynamic::DynamicFields;
pub use router::{AdviceRouter, AdviceTicket, IgnoreReason, RouteDecision};
pub use session::{HistoryKey, LastFocus, MessageId, SessionContext};
