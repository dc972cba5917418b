pub mod auth;
pub mod batch;
pub mod classify;
pub mod commands;
pub mod config;
pub mod driver;
pub mod error;
pub mod harvest;
pub mod invitations;
pub mod sanitize;
pub mod secrets;
pub mod store;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use auth::{ensure_signed_in, LoginState};
pub use batch::{plan_batch, BatchProcessor, BatchSummary, CancelFlag, ProgressReporter};
pub use classify::{Classifier, Outcome};
pub use config::{load_config, load_or_default, Config};
pub use driver::{Locator, SessionGuard, UiDriver, WebDriverSession};
pub use error::{AuthError, ConfigError, DriverError, LinkreachError, Result, StoreError};
pub use harvest::{EntityReference, HarvestReport, Harvester};
pub use invitations::{
    Invitation, InvitationDecision, InvitationManager, InvitationOutcome, InvitationReport,
};
pub use secrets::{resolve_secret, Credentials, SecretError};
pub use store::{JsonFileStore, OutreachRecord, RecordSet, RecordStore};
