//! Serial and company numbering for freshly imported records.

use std::collections::HashMap;

use log::debug;
use url::Url;

use super::record::{FounderEntry, OutreachRecord};

/// Identity used to group records into companies.
///
/// Parsed URLs are compared without query, fragment or trailing slash, with
/// scheme and host lowercased. Anything unparseable is compared as trimmed
/// text.
pub fn canonical_parent_id(raw: &str) -> String {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            let path = url.path().trim_end_matches('/').to_string();
            url.set_path(&path);
            url.to_string().trim_end_matches('/').to_string()
        }
        Err(_) => trimmed.trim_end_matches('/').to_string(),
    }
}

/// Whether `raw` points at a person's profile on the networking site.
///
/// Company pages and school pages are rejected even though they live on the
/// same host.
pub fn is_personal_profile(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw.trim()) else {
        return false;
    };
    let on_site = url
        .host_str()
        .is_some_and(|host| host == "linkedin.com" || host.ends_with(".linkedin.com"));
    let path = url.path();
    on_site
        && path.starts_with("/in/")
        && path.len() > "/in/".len()
        && !path.contains("/school/")
        && !path.contains("/company/")
}

/// Numbers extraction output into store records.
///
/// Serial numbers follow input order starting at 1; company numbers follow the
/// first appearance of each canonical parent. Entries whose profile link is
/// not a personal profile keep their slot but lose their action target.
pub fn number_entries(entries: Vec<FounderEntry>) -> Vec<OutreachRecord> {
    let mut companies: HashMap<String, u32> = HashMap::new();

    entries
        .into_iter()
        .enumerate()
        .map(|(index, mut entry)| {
            let next = companies.len() as u32 + 1;
            let company_number = *companies
                .entry(canonical_parent_id(&entry.company_yc_url))
                .or_insert(next);

            if let Some(url) = entry.linkedin_url.as_deref() {
                if !url.trim().is_empty() && !is_personal_profile(url) {
                    debug!("Dropping non-profile link for {}", entry.founder_name);
                    entry.linkedin_url = None;
                }
            }

            OutreachRecord::from_entry(index as u32 + 1, company_number, entry)
        })
        .collect()
}
