//! Signing in to the networking site before a batch.

use secrecy::ExposeSecret;
use tracing::{debug, info, info_span, warn};

use crate::config::LoginConfig;
use crate::driver::UiDriver;
use crate::error::AuthError;
use crate::secrets::Credentials;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    /// The browser profile still held a valid session.
    AlreadySignedIn,
    SignedIn,
}

/// Makes sure the session is authenticated.
///
/// Opens the login page; if the signed-in marker shows up there the
/// session is reused. Otherwise fills in the form and waits for the marker.
/// Credentials are only read when the form has to be submitted.
pub fn ensure_signed_in<F>(
    driver: &mut dyn UiDriver,
    config: &LoginConfig,
    credentials: F,
) -> Result<LoginState, AuthError>
where
    F: FnOnce() -> Result<Credentials, AuthError>,
{
    let _span = info_span!("login").entered();

    driver.navigate(&config.url)?;
    if driver
        .wait_for(&config.logged_in_marker, config.already_logged_in_timeout())?
        .is_some()
    {
        info!("Existing session is still signed in");
        return Ok(LoginState::AlreadySignedIn);
    }

    let credentials = credentials()?;
    let username = driver
        .find_one(&config.username_field)?
        .ok_or_else(|| AuthError::LoginFailed {
            reason: "login form not found".to_string(),
        })?;
    let password = driver
        .find_one(&config.password_field)?
        .ok_or_else(|| AuthError::LoginFailed {
            reason: "password field not found".to_string(),
        })?;

    driver.type_text(&username, credentials.email.expose_secret())?;
    driver.type_text(&password, credentials.password.expose_secret())?;
    debug!("Credentials entered");

    let submit = driver
        .find_one(&config.submit_button)?
        .ok_or_else(|| AuthError::LoginFailed {
            reason: "submit button not found".to_string(),
        })?;
    driver.click(&submit)?;

    match driver.wait_for(&config.logged_in_marker, config.login_timeout())? {
        Some(_) => {
            info!("Signed in");
            Ok(LoginState::SignedIn)
        }
        None => {
            warn!("Signed-in page did not appear after submitting credentials");
            Err(AuthError::LoginFailed {
                reason: format!(
                    "no signed-in page within {}s (wrong credentials or a security checkpoint)",
                    config.login_timeout().as_secs()
                ),
            })
        }
    }
}
