use serde::{Deserialize, Serialize};

/// Structural class markers an element must carry before it is trusted.
///
/// A control is accepted only when it has every `required` class, at least
/// one of `any_of` (when that list is non-empty) and none of `excluded`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerRule {
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub any_of: Vec<String>,
    #[serde(default)]
    pub excluded: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerVerdict {
    Accepted,
    MissingRequired(Vec<String>),
    MissingStyle,
    Excluded(String),
}

impl MarkerVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, MarkerVerdict::Accepted)
    }
}

impl MarkerRule {
    pub fn new(required: &[&str], any_of: &[&str], excluded: &[&str]) -> Self {
        Self {
            required: owned(required),
            any_of: owned(any_of),
            excluded: owned(excluded),
        }
    }

    pub fn evaluate<S: AsRef<str>>(&self, classes: &[S]) -> MarkerVerdict {
        let has = |wanted: &str| classes.iter().any(|c| c.as_ref() == wanted);

        if let Some(hit) = self.excluded.iter().find(|c| has(c.as_str())) {
            return MarkerVerdict::Excluded(hit.clone());
        }

        let missing: Vec<String> = self.required.iter().filter(|c| !has(c.as_str())).cloned().collect();
        if !missing.is_empty() {
            return MarkerVerdict::MissingRequired(missing);
        }

        if !self.any_of.is_empty() && !self.any_of.iter().any(|c| has(c.as_str())) {
            return MarkerVerdict::MissingStyle;
        }

        MarkerVerdict::Accepted
    }

    pub fn accepts<S: AsRef<str>>(&self, classes: &[S]) -> bool {
        self.evaluate(classes).is_accepted()
    }
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
