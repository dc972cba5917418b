use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::classify::Outcome;

/// `connection_status` as stored: an outcome, or `"NA"` before any visit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionStatus {
    #[default]
    #[serde(rename = "NA")]
    Unset,
    #[serde(rename = "already_connected")]
    AlreadyConnected,
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "connection_sent")]
    ConnectionSent,
    #[serde(rename = "email_required")]
    EmailRequired,
    #[serde(rename = "not_available")]
    NotAvailable,
    #[serde(rename = "action_failed")]
    ActionFailed,
}

impl ConnectionStatus {
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            ConnectionStatus::Unset => None,
            ConnectionStatus::AlreadyConnected => Some(Outcome::AlreadyConnected),
            ConnectionStatus::Pending => Some(Outcome::Pending),
            ConnectionStatus::ConnectionSent => Some(Outcome::ConnectionSent),
            ConnectionStatus::EmailRequired => Some(Outcome::EmailRequired),
            ConnectionStatus::NotAvailable => Some(Outcome::NotAvailable),
            ConnectionStatus::ActionFailed => Some(Outcome::ActionFailed),
        }
    }
}

impl From<Outcome> for ConnectionStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::AlreadyConnected => ConnectionStatus::AlreadyConnected,
            Outcome::Pending => ConnectionStatus::Pending,
            Outcome::ConnectionSent => ConnectionStatus::ConnectionSent,
            Outcome::EmailRequired => ConnectionStatus::EmailRequired,
            Outcome::NotAvailable => ConnectionStatus::NotAvailable,
            Outcome::ActionFailed => ConnectionStatus::ActionFailed,
        }
    }
}

/// One founder/company pairing produced by the extraction phase, before it
/// is numbered into the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FounderEntry {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub founder_name: String,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub company_linkedin: Option<String>,
    /// Directory page of the company; groups founders into companies.
    #[serde(default)]
    pub company_yc_url: String,
    /// Free-text extraction fields (about, website, team size, ...).
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// One row of the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutreachRecord {
    pub serial_number: u32,
    pub company_number: u32,
    #[serde(default)]
    pub processed_data: bool,
    #[serde(default)]
    pub connection_status: ConnectionStatus,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub founder_name: String,
    #[serde(default, rename = "linkedin_url")]
    pub action_target_url: Option<String>,
    #[serde(default)]
    pub company_linkedin: Option<String>,
    #[serde(default, rename = "company_yc_url")]
    pub parent_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl OutreachRecord {
    pub fn from_entry(serial_number: u32, company_number: u32, entry: FounderEntry) -> Self {
        Self {
            serial_number,
            company_number,
            processed_data: false,
            connection_status: ConnectionStatus::Unset,
            company_name: entry.company_name,
            founder_name: entry.founder_name,
            action_target_url: entry.linkedin_url,
            company_linkedin: entry.company_linkedin,
            parent_url: entry.company_yc_url,
            processed_at: None,
            attributes: entry.attributes,
        }
    }

    /// The profile to visit, if the record has a usable one.
    pub fn action_target(&self) -> Option<&str> {
        self.action_target_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn is_actionable(&self) -> bool {
        self.action_target().is_some()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.connection_status.outcome()
    }
}
