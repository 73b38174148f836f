//! Panel-side advice routing: reuse, ignore, or ask the backend.

use std::collections::HashSet;

use shadowpilot_config::DynamicFieldRule;
use shadowpilot_protocols::{Intent, IntentKind};
use tracing::debug;

use crate::dynamic::DynamicFields;
use crate::session::{HistoryKey, MessageId, SessionContext};

/// Why an intent produced no work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The field's dynamic class was confirmed earlier in the session.
    Confirmed(String),
    /// A request for the same field is still outstanding.
    InFlight,
}

/// A granted backend request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdviceTicket {
    /// Set for field focus intents.
    pub key: Option<HistoryKey>,
    /// Set when the field matched a dynamic field rule.
    pub dynamic_class: Option<String>,
}

impl AdviceTicket {
    /// Answers for static fields are remembered in history.
    pub fn is_cacheable(&self) -> bool {
        self.key.is_some() && self.dynamic_class.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Scroll to and highlight an existing answer.
    Reuse(MessageId),
    Ignore(IgnoreReason),
    Ask(AdviceTicket),
}

/// Decides, per intent, whether the backend needs to be consulted.
pub struct AdviceRouter {
    dynamic_fields: DynamicFields,
    in_flight: HashSet<HistoryKey>,
}

impl AdviceRouter {
    pub fn new(rules: Vec<DynamicFieldRule>) -> Self {
        Self {
            dynamic_fields: DynamicFields::new(rules),
            in_flight: HashSet::new(),
        }
    }

    pub fn route(&mut self, session: &SessionContext, intent: &Intent) -> RouteDecision {
        if intent.kind != IntentKind::FieldFocus {
            return RouteDecision::Ask(AdviceTicket {
                key: None,
                dynamic_class: None,
            });
        }

        let key = HistoryKey::new(&intent.label, intent.connector_or_unknown());
        let dynamic_class = self.dynamic_fields.class_of(&intent.label).map(str::to_string);

        match &dynamic_class {
            Some(class) if session.is_confirmed(class) => {
                debug!(label = %intent.label, class = %class, "Dynamic field already confirmed");
                return RouteDecision::Ignore(IgnoreReason::Confirmed(class.clone()));
            }
            Some(_) => {}
            None => {
                if let Some(id) = session.history_get(&key) {
                    debug!(label = %intent.label, message = %id, "Reusing earlier advice");
                    return RouteDecision::Reuse(id);
                }
            }
        }

        if !self.in_flight.insert(key.clone()) {
            debug!(label = %intent.label, "Advice already requested");
            return RouteDecision::Ignore(IgnoreReason::InFlight);
        }

        RouteDecision::Ask(AdviceTicket {
            key: Some(key),
            dynamic_class,
        })
    }

    /// Release the in-flight slot held by `ticket`.
    pub fn complete(&mut self, ticket: &AdviceTicket) {
        if let Some(key) = &ticket.key {
            self.in_flight.remove(key);
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadowpilot_config::PanelConfig;

    fn router() -> AdviceRouter {
        AdviceRouter::new(PanelConfig::default().dynamic_fields)
    }

    fn session() -> SessionContext {
        SessionContext::new(vec!["connector".to_string()])
    }

    fn focus(label: &str, connector: &str) -> Intent {
        Intent::new(IntentKind::FieldFocus, label, 0).with_connector(connector)
    }

    #[test]
    fn test_first_focus_asks() {
        let mut router = router();
        let decision = router.route(&session(), &focus("Display Name", "Jira"));
        match decision {
            RouteDecision::Ask(ticket) => {
                assert!(ticket.is_cacheable());
                assert_eq!(ticket.key, Some(HistoryKey::new("Display Name", "Jira")));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(router.in_flight(), 1);
    }

    #[test]
    fn test_answered_field_reused() {
        let mut router = router();
        let mut session = session();
        session.history_insert(HistoryKey::new("Display Name", "Jira"), MessageId(7));
        assert_eq!(
            router.route(&session, &focus("Display Name", "Jira")),
            RouteDecision::Reuse(MessageId(7))
        );
        assert_eq!(router.in_flight(), 0);
    }

    #[test]
    fn test_unknown_connector_key() {
        let mut router = router();
        let mut session = session();
        session.history_insert(HistoryKey::new("Display Name", "Unknown Context"), MessageId(3));
        assert_eq!(
            router.route(&session, &focus("Display Name", "")),
            RouteDecision::Reuse(MessageId(3))
        );
    }

    #[test]
    fn test_dynamic_field_always_asks() {
        let mut router = router();
        let mut session = session();
        session.history_insert(HistoryKey::new("Graph connector agent", "Jira"), MessageId(2));
        let decision = router.route(&session, &focus("Graph connector agent", "Jira"));
        match decision {
            RouteDecision::Ask(ticket) => {
                assert_eq!(ticket.dynamic_class.as_deref(), Some("connector_agent"));
                assert!(!ticket.is_cacheable());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_confirmed_dynamic_class_ignored() {
        let mut router = router();
        let mut session = session();
        session.confirm("connector_agent");
        assert_eq!(
            router.route(&session, &focus("Graph connector agent", "Jira")),
            RouteDecision::Ignore(IgnoreReason::Confirmed("connector_agent".to_string()))
        );
    }

    #[test]
    fn test_in_flight_not_requested_twice() {
        let mut router = router();
        let session = session();
        let intent = focus("Display Name", "Jira");
        let RouteDecision::Ask(ticket) = router.route(&session, &intent) else {
            panic!("expected ask");
        };
        assert_eq!(
            router.route(&session, &intent),
            RouteDecision::Ignore(IgnoreReason::InFlight)
        );
        router.complete(&ticket);
        assert!(matches!(router.route(&session, &intent), RouteDecision::Ask(_)));
    }

    #[test]
    fn test_click_intents_always_ask() {
        let mut router = router();
        let intent = Intent::new(IntentKind::StepProgression, "Next", 0);
        let decision = router.route(&session(), &intent);
        assert_eq!(
            decision,
            RouteDecision::Ask(AdviceTicket {
                key: None,
                dynamic_class: None
            })
        );
        router.route(&session(), &intent);
        assert_eq!(router.in_flight(), 0);
    }
}
