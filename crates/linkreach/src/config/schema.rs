use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::classify::markers::MarkerRule;
use crate::driver::Locator;

pub const CONFIG_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_data_directory")]
    pub data_directory: String,
    #[serde(default)]
    pub webdriver: WebDriverConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub harvest: HarvestConfig,
    #[serde(default)]
    pub login: LoginConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub invitations: InvitationsConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

fn default_data_directory() -> String {
    "Scraper_Data".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            data_directory: default_data_directory(),
            webdriver: WebDriverConfig::default(),
            directory: DirectoryConfig::default(),
            harvest: HarvestConfig::default(),
            login: LoginConfig::default(),
            profile: ProfileConfig::default(),
            batch: BatchConfig::default(),
            invitations: InvitationsConfig::default(),
            credentials: CredentialsConfig::default(),
        }
    }
}

impl Config {
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_directory)
    }
}

// ── Browser session ──

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebDriverConfig {
    /// Address of a running chromedriver (or any W3C WebDriver server).
    pub endpoint: String,
    pub browser_name: String,
    pub headless: bool,
    /// Persistent browser profile so the login survives between runs.
    pub user_data_dir: Option<String>,
    pub args: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9515".to_string(),
            browser_name: "chrome".to_string(),
            headless: false,
            user_data_dir: None,
            args: vec![
                "--start-maximized".to_string(),
                "--disable-notifications".to_string(),
                "--disable-popup-blocking".to_string(),
                "--disable-blink-features=AutomationControlled".to_string(),
            ],
            request_timeout_secs: 60,
        }
    }
}

// ── Startup directory listing ──

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub base_url: String,
    pub listing_path: String,
    /// Path prefix every entity link must carry.
    pub entity_path_prefix: String,
    pub entity_links: Locator,
    /// Identifiers under the prefix that are navigation pages, not entities.
    pub denied_identifiers: Vec<String>,
    pub min_identifier_len: usize,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.ycombinator.com".to_string(),
            listing_path: "/companies".to_string(),
            entity_path_prefix: "/companies/".to_string(),
            entity_links: Locator::css("a[href^='/companies/']"),
            denied_identifiers: [
                "founders",
                "industry",
                "location",
                "batch",
                "tags",
                "black-founders",
                "hispanic-latino-founders",
                "women-founders",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            min_identifier_len: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub max_scrolls: u32,
    pub pause_ms: u64,
    /// Consecutive scrolls without new entities before the recovery attempt.
    pub max_stalls: u32,
    /// Extra wait before trusting an unchanged page extent.
    pub settle_pause_ms: u64,
    pub recovery_pause_ms: u64,
    pub initial_load_ms: u64,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            max_scrolls: 20,
            pause_ms: 3000,
            max_stalls: 3,
            settle_pause_ms: 6000,
            recovery_pause_ms: 9000,
            initial_load_ms: 5000,
        }
    }
}

impl HarvestConfig {
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    pub fn settle_pause(&self) -> Duration {
        Duration::from_millis(self.settle_pause_ms)
    }

    pub fn recovery_pause(&self) -> Duration {
        Duration::from_millis(self.recovery_pause_ms)
    }

    pub fn initial_load(&self) -> Duration {
        Duration::from_millis(self.initial_load_ms)
    }
}

// ── Networking site ──

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    pub url: String,
    /// Present only for an authenticated session.
    pub logged_in_marker: Locator,
    pub username_field: Locator,
    pub password_field: Locator,
    pub submit_button: Locator,
    pub already_logged_in_timeout_ms: u64,
    pub login_timeout_ms: u64,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            url: "https://www.linkedin.com/login".to_string(),
            logged_in_marker: Locator::css(".scaffold-finite-scroll__content"),
            username_field: Locator::css("#username"),
            password_field: Locator::css("#password"),
            submit_button: Locator::css("button[type='submit']"),
            already_logged_in_timeout_ms: 5000,
            login_timeout_ms: 15000,
        }
    }
}

impl LoginConfig {
    pub fn already_logged_in_timeout(&self) -> Duration {
        Duration::from_millis(self.already_logged_in_timeout_ms)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_millis(self.login_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub locators: ProfileLocators,
    /// Classes a direct "Connect" button must carry to be trusted.
    pub connect_markers: MarkerRule,
    /// Classes that identify the inert "Pending" button.
    pub pending_markers: MarkerRule,
    pub timeouts: ProfileTimeouts,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            locators: ProfileLocators::default(),
            connect_markers: MarkerRule::new(
                &["artdeco-button", "artdeco-button--2", "ember-view"],
                &["artdeco-button--primary", "artdeco-button--secondary"],
                &["artdeco-button--muted"],
            ),
            pending_markers: MarkerRule::new(
                &["artdeco-button", "artdeco-button--2"],
                &["artdeco-button--secondary", "artdeco-button--muted"],
                &[],
            ),
            timeouts: ProfileTimeouts::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileLocators {
    pub more_button: Locator,
    pub menu_remove_connection: Locator,
    pub menu_connect: Locator,
    pub pending_button: Locator,
    pub connect_label: Locator,
    /// Resolves from a label to the element that carries the button classes.
    pub label_parent: Locator,
    pub email_dialog: Locator,
    pub dialog_dismiss: Locator,
    pub send_without_note: Locator,
}

impl Default for ProfileLocators {
    fn default() -> Self {
        Self {
            more_button: Locator::xpath(
                "//button[contains(@class, 'artdeco-dropdown__trigger') and .//span[text()='More']]",
            ),
            menu_remove_connection: Locator::xpath(
                "//div[contains(@class, 'artdeco-dropdown__content')]//span[text()='Remove connection']",
            ),
            menu_connect: Locator::xpath(
                "//div[contains(@class, 'artdeco-dropdown__content')]//span[contains(@class, 'display-flex') and contains(@class, 't-normal') and contains(@class, 'flex-1') and text()='Connect']",
            ),
            pending_button: Locator::xpath(
                "//button[.//span[contains(@class, 'artdeco-button__text') and normalize-space(text())='Pending']]",
            ),
            connect_label: Locator::xpath(
                "//span[contains(@class, 'artdeco-button__text') and text()='Connect']",
            ),
            label_parent: Locator::xpath(".."),
            email_dialog: Locator::xpath(
                "//div[@role='dialog']//input[@type='email' or @name='email']",
            ),
            dialog_dismiss: Locator::xpath("//div[@role='dialog']//button[@aria-label='Dismiss']"),
            send_without_note: Locator::xpath(
                "//button[contains(@class, 'artdeco-button') and .//span[text()='Send without a note']]",
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileTimeouts {
    pub menu_ms: u64,
    pub menu_item_ms: u64,
    pub direct_button_ms: u64,
    pub email_dialog_ms: u64,
    pub confirm_ms: u64,
    pub after_click_ms: u64,
}

impl Default for ProfileTimeouts {
    fn default() -> Self {
        Self {
            menu_ms: 10_000,
            menu_item_ms: 3_000,
            direct_button_ms: 10_000,
            email_dialog_ms: 2_000,
            confirm_ms: 10_000,
            after_click_ms: 1_000,
        }
    }
}

impl ProfileTimeouts {
    pub fn menu(&self) -> Duration {
        Duration::from_millis(self.menu_ms)
    }

    pub fn menu_item(&self) -> Duration {
        Duration::from_millis(self.menu_item_ms)
    }

    pub fn direct_button(&self) -> Duration {
        Duration::from_millis(self.direct_button_ms)
    }

    pub fn email_dialog(&self) -> Duration {
        Duration::from_millis(self.email_dialog_ms)
    }

    pub fn confirm(&self) -> Duration {
        Duration::from_millis(self.confirm_ms)
    }

    pub fn after_click(&self) -> Duration {
        Duration::from_millis(self.after_click_ms)
    }
}

// ── Batch run ──

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub default_count: usize,
    pub pacing_min_ms: u64,
    pub pacing_max_ms: u64,
    /// Wait after opening a profile before probing it.
    pub page_settle_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            default_count: 10,
            pacing_min_ms: 10_000,
            pacing_max_ms: 15_000,
            page_settle_ms: 5_000,
        }
    }
}

impl BatchConfig {
    pub fn page_settle(&self) -> Duration {
        Duration::from_millis(self.page_settle_ms)
    }
}

// ── Received invitations ──

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InvitationsConfig {
    pub url: String,
    pub locators: InvitationLocators,
    /// How long to wait for the first invitation card after opening the page.
    pub load_timeout_ms: u64,
    pub max_scrolls: u32,
    pub pause_ms: u64,
    pub max_stalls: u32,
    /// Wait after an accept or ignore click.
    pub after_action_ms: u64,
    /// Gap between two answered invitations.
    pub between_actions_ms: u64,
}

impl Default for InvitationsConfig {
    fn default() -> Self {
        Self {
            url: "https://www.linkedin.com/mynetwork/invitation-manager/received/".to_string(),
            locators: InvitationLocators::default(),
            load_timeout_ms: 15_000,
            max_scrolls: 20,
            pause_ms: 3_000,
            max_stalls: 3,
            after_action_ms: 2_000,
            between_actions_ms: 3_000,
        }
    }
}

impl InvitationsConfig {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    pub fn after_action(&self) -> Duration {
        Duration::from_millis(self.after_action_ms)
    }

    pub fn between_actions(&self) -> Duration {
        Duration::from_millis(self.between_actions_ms)
    }
}

/// Everything below `card` is looked up inside one invitation card.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InvitationLocators {
    pub card: Locator,
    pub profile_link: Locator,
    pub name: Locator,
    pub text_lines: Locator,
    pub image: Locator,
    pub verified_badge: Locator,
    pub accept_button: Locator,
    pub ignore_button: Locator,
}

impl Default for InvitationLocators {
    fn default() -> Self {
        Self {
            card: Locator::css("[data-view-name='pending-invitation']"),
            profile_link: Locator::css("a[href*='/in/']"),
            name: Locator::css("strong"),
            text_lines: Locator::css("p"),
            image: Locator::css("img"),
            verified_badge: Locator::css("svg#verified-small"),
            accept_button: Locator::xpath(".//button[contains(@aria-label, 'Accept')]"),
            ignore_button: Locator::xpath(".//button[contains(@aria-label, 'Ignore')]"),
        }
    }
}

// ── Credentials ──

/// One secret with its candidate sources. See [`crate::secrets::resolve_secret`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretSource {
    pub value: Option<String>,
    pub file: Option<String>,
    pub env_var: Option<String>,
}

impl SecretSource {
    pub fn env(name: &str) -> Self {
        Self {
            env_var: Some(name.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub email: SecretSource,
    pub password: SecretSource,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            email: SecretSource::env("LINKEDIN_EMAIL"),
            password: SecretSource::env("LINKEDIN_PASSWORD"),
        }
    }
}
