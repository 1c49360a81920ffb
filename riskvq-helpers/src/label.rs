use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Risk assumed for a label pair that was never configured.
pub const DEFAULT_RISK: f64 = 1.0;

/// A class identity together with its misclassification risks.
///
/// `risk(other)` is the cost of classifying a point of this class as
/// `other`. The risk to itself is zero; pairs that were never configured
/// report [`DEFAULT_RISK`].
///
/// Labels compare and hash by name only. A `Label` is a cheap shared handle:
/// configure the risks first, then clone it into points. Changing the risks
/// of one handle does not reach handles cloned before the change.
#[derive(Clone)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Label {
    name: Arc<str>,
    risks: Arc<HashMap<Arc<str>, f64>>,
}

impl Label {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        let mut risks = HashMap::new();
        risks.insert(name.clone(), 0.0);
        Label { name, risks: Arc::new(risks) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the cost of misclassifying this class as `other`.
    pub fn set_risk(&mut self, other: &Label, risk: f64) {
        Arc::make_mut(&mut self.risks).insert(other.name.clone(), risk);
    }

    pub fn with_risk(mut self, other: &Label, risk: f64) -> Self {
        self.set_risk(other, risk);
        self
    }

    pub fn risk(&self, other: &Label) -> f64 {
        self.risks.get(&other.name).copied().unwrap_or(DEFAULT_RISK)
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Label {}

impl Hash for Label {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Label {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

impl Debug for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Label({:?})", self.name)
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
