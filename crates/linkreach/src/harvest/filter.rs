use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::DirectoryConfig;

/// Absolute URL of one harvested listing entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityReference(String);

impl EntityReference {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for EntityReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decides which raw links on a listing page are entities.
///
/// A link is kept when, resolved against the base URL, it stays on the same
/// host and its path is exactly `<prefix><identifier>` (an optional trailing
/// slash is tolerated) with an identifier that is long enough and not a known
/// navigation page.
#[derive(Debug, Clone)]
pub struct ReferenceFilter {
    base: Url,
    prefix: String,
    denied: HashSet<String>,
    min_identifier_len: usize,
}

impl ReferenceFilter {
    pub fn new(
        base: Url,
        prefix: &str,
        denied: impl IntoIterator<Item = String>,
        min_identifier_len: usize,
    ) -> Self {
        Self {
            base,
            prefix: prefix.to_string(),
            denied: denied.into_iter().map(|d| d.to_lowercase()).collect(),
            min_identifier_len,
        }
    }

    pub fn from_config(config: &DirectoryConfig) -> Result<Self, url::ParseError> {
        let base = Url::parse(&config.base_url)?;
        Ok(Self::new(
            base,
            &config.entity_path_prefix,
            config.denied_identifiers.iter().cloned(),
            config.min_identifier_len,
        ))
    }

    /// Returns the canonical reference for `raw`, or `None` if it is not an
    /// entity link.
    pub fn accept(&self, raw: &str) -> Option<EntityReference> {
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with('?') || raw.starts_with('#') {
            return None;
        }

        let url = self.base.join(raw).ok()?;
        if url.host_str() != self.base.host_str() {
            return None;
        }

        let identifier = url.path().strip_prefix(&self.prefix)?;
        let identifier = identifier.strip_suffix('/').unwrap_or(identifier);
        if identifier.contains('/') || identifier.chars().count() < self.min_identifier_len {
            return None;
        }
        if self.denied.contains(&identifier.to_lowercase()) {
            return None;
        }

        let mut canonical = url.clone();
        canonical.set_query(None);
        canonical.set_fragment(None);
        canonical.set_path(&format!("{}{}", self.prefix, identifier));
        Some(EntityReference(canonical.to_string()))
    }

    /// Filters and deduplicates, keeping the first-seen order.
    pub fn collect<I, S>(&self, raw_links: I) -> Vec<EntityReference>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        raw_links
            .into_iter()
            .filter_map(|raw| self.accept(raw.as_ref()))
            .filter(|reference| seen.insert(reference.clone()))
            .collect()
    }
}
