//! Page-side intent classifier and deduplicator.
//!
//! Consumes raw observer signals and produces at most one message per
//! coalesced user action. All timing is passed in as `now`, so the
//! classifier is deterministic and the owning actor decides how to wait
//! for [`IntentClassifier::next_deadline`].

use std::time::Duration;

use shadowpilot_config::{DynamicFieldRule, ObserverConfig, TimingConfig};
use shadowpilot_observer::{RawSignal, SignalKind};
use shadowpilot_protocols::{ContextUpdate, Intent, IntentKind, PanelMessage};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::debounce::Debounce;
use crate::dynamic::DynamicFields;
use crate::session::SessionContext;

pub struct IntentClassifier {
    focus_debounce: Duration,
    focus_cooldown: Duration,
    intent_cooldown: Duration,
    context_idle: Duration,
    connectors: Vec<String>,
    dynamic_fields: DynamicFields,
    origin: Instant,
    session: SessionContext,
    pending_focus: Debounce<RawSignal>,
    /// Connector captured from the last card click.
    click_hint: Option<String>,
}

impl IntentClassifier {
    pub fn new(timing: &TimingConfig, observer: &ObserverConfig, origin: Instant) -> Self {
        Self {
            focus_debounce: timing.focus_debounce(),
            focus_cooldown: timing.focus_cooldown(),
            intent_cooldown: timing.intent_cooldown(),
            context_idle: timing.context_idle(),
            connectors: observer.connectors.clone(),
            dynamic_fields: DynamicFields::default(),
            origin,
            session: SessionContext::new(observer.connector_context_markers.clone()),
            pending_focus: Debounce::new(),
            click_hint: None,
        }
    }

    /// Recognise dynamic field classes so they can be locked.
    pub fn with_dynamic_fields(mut self, rules: Vec<DynamicFieldRule>) -> Self {
        self.dynamic_fields = DynamicFields::new(rules);
        self
    }

    /// Stop reporting fields of a class the user confirmed. A pending focus
    /// on such a field is dropped.
    pub fn lock_field_class(&mut self, class: &str) -> bool {
        if !self.session.confirm(class) {
            return false;
        }
        info!(class = %class, "Field class locked");
        let pending_locked = self
            .pending_focus
            .pending()
            .is_some_and(|signal| self.is_locked(&signal.label));
        if pending_locked {
            self.pending_focus.cancel();
        }
        true
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// When [`IntentClassifier::poll`] next has something to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending_focus.deadline()
    }

    pub fn has_pending_focus(&self) -> bool {
        self.pending_focus.is_pending()
    }

    /// Feed one raw signal observed at `now`.
    pub fn on_signal(&mut self, signal: RawSignal, now: Instant) -> Vec<PanelMessage> {
        match signal.kind {
            SignalKind::FieldFocus => {
                self.on_focus(signal, now);
                Vec::new()
            }
            SignalKind::Blur => {
                if self.pending_focus.cancel().is_some() {
                    debug!("Pending field focus cancelled by blur");
                }
                Vec::new()
            }
            SignalKind::Navigation => {
                self.on_navigation(&signal.url);
                Vec::new()
            }
            SignalKind::ConnectorHint => {
                if let Some(name) = signal.connector_guess.filter(|n| !n.trim().is_empty()) {
                    self.session.observe_detection(Some(&name));
                    self.click_hint = Some(name);
                }
                Vec::new()
            }
            SignalKind::StepProgression | SignalKind::ConnectionStart => {
                self.on_click(signal, now).into_iter().collect()
            }
            SignalKind::PageScan => self.on_scan(signal, now).into_iter().collect(),
        }
    }

    /// Fire the pending field focus if its dwell time has elapsed.
    pub fn poll(&mut self, now: Instant) -> Vec<PanelMessage> {
        let Some(signal) = self.pending_focus.take_due(now) else {
            return Vec::new();
        };
        let connector = self.resolve_connector(None, &signal.title);
        let intent = Intent::new(IntentKind::FieldFocus, signal.label.clone(), self.elapsed_ms(now))
            .with_value(signal.value)
            .with_connector(connector);

        self.session.record_focus(signal.target, &signal.label, now);
        self.session.record_intent(IntentKind::FieldFocus, now);
        info!(label = %intent.label, connector = %intent.connector_or_unknown(), "Field focus intent");
        vec![PanelMessage::UserIntent(intent)]
    }

    fn on_focus(&mut self, signal: RawSignal, now: Instant) {
        if self.pending_focus.cancel().is_some() {
            debug!("Pending field focus replaced by new focus");
        }
        if self.is_locked(&signal.label) {
            debug!(label = %signal.label, "Field focus dropped, class locked");
            return;
        }
        if let Some(last) = self.session.last_focus() {
            if last.is_same_field(signal.target, &signal.label)
                && now.saturating_duration_since(last.at) < self.focus_cooldown
            {
                debug!(label = %signal.label, "Field focus suppressed by cooldown");
                return;
            }
        }
        self.session.observe_detection(signal.connector_guess.as_deref());
        self.pending_focus.schedule(now + self.focus_debounce, signal);
    }

    fn on_navigation(&mut self, url: &str) {
        if self.pending_focus.cancel().is_some() {
            debug!("Pending field focus cancelled by navigation");
        }
        if self.session.navigate(url) && self.session.detected_connector().is_none() {
            self.click_hint = None;
        }
    }

    fn on_click(&mut self, signal: RawSignal, now: Instant) -> Option<PanelMessage> {
        if let Some(last) = self.session.last_intent_at() {
            if now.saturating_duration_since(last) < self.intent_cooldown {
                debug!(label = %signal.label, "Click intent suppressed by cooldown");
                return None;
            }
        }

        let kind = match signal.kind {
            SignalKind::ConnectionStart => IntentKind::InitializeConnection,
            _ => IntentKind::StepProgression,
        };
        let connector = self.resolve_connector(signal.connector_guess.as_deref(), &signal.title);
        if kind == IntentKind::InitializeConnection {
            self.session.observe_detection(Some(&connector));
        }

        let intent = Intent::new(kind, signal.label, self.elapsed_ms(now)).with_connector(connector);
        self.session.record_intent(kind, now);
        info!(kind = %kind, connector = %intent.connector_or_unknown(), "Click intent");
        Some(PanelMessage::UserIntent(intent))
    }

    fn on_scan(&mut self, signal: RawSignal, now: Instant) -> Option<PanelMessage> {
        self.session.navigate(&signal.url);
        self.session.observe_detection(signal.connector_guess.as_deref());

        let header = signal.label.trim();
        if header.is_empty() {
            return None;
        }
        if let Some(last) = self.session.last_intent_at() {
            if now.saturating_duration_since(last) < self.intent_cooldown {
                debug!(header = %header, "Context update suppressed by cooldown");
                return None;
            }
        }
        if let Some(last) = self.session.last_explicit_intent_at() {
            if now.saturating_duration_since(last) < self.context_idle {
                debug!(header = %header, "Context update suppressed, user is active");
                return None;
            }
        }
        if self.session.is_duplicate_context(&signal.url, header) {
            debug!(header = %header, "Context update unchanged");
            return None;
        }

        let update = ContextUpdate {
            url: signal.url.clone(),
            title: signal.title.clone(),
            page_header: header.to_string(),
            recent_intent: self.session.recent_intent(),
            connector: self.session.detected_connector().unwrap_or_default().to_string(),
        };
        self.session.record_context(&signal.url, header);
        self.session.record_intent(IntentKind::ContextUpdate, now);
        info!(header = %update.page_header, "Context update");
        Some(PanelMessage::ContextUpdate(update))
    }

    fn is_locked(&self, label: &str) -> bool {
        self.dynamic_fields
            .class_of(label)
            .is_some_and(|class| self.session.is_confirmed(class))
    }

    /// Explicit name, then the click-captured name, the session connector
    /// and finally a match against the document title. Empty when nothing fits.
    fn resolve_connector(&self, explicit: Option<&str>, title: &str) -> String {
        explicit
            .filter(|n| !n.trim().is_empty())
            .or(self.click_hint.as_deref())
            .or(self.session.detected_connector())
            .map(str::to_string)
            .or_else(|| self.title_connector(title))
            .unwrap_or_default()
    }

    fn title_connector(&self, title: &str) -> Option<String> {
        let title = title.to_lowercase();
        self.connectors
            .iter()
            .find(|c| !c.is_empty() && title.contains(&c.to_lowercase()))
            .cloned()
    }

    fn elapsed_ms(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.origin).as_millis() as u64
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
