//! Dynamic field classes, recognised by label keywords.

use shadowpilot_config::DynamicFieldRule;

/// Normalised [`DynamicFieldRule`]s. Both contexts hold a copy.
#[derive(Debug, Clone, Default)]
pub struct DynamicFields {
    rules: Vec<DynamicFieldRule>,
}

impl DynamicFields {
    pub fn new(rules: Vec<DynamicFieldRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| DynamicFieldRule {
                class: rule.class,
                keywords: rule
                    .keywords
                    .into_iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect(),
            })
            .collect();
        Self { rules }
    }

    /// Class of the first rule whose keyword appears in `label`.
    pub fn class_of(&self, label: &str) -> Option<&str> {
        let label = label.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| label.contains(k.as_str())))
            .map(|rule| rule.class.as_str())
    }
}
