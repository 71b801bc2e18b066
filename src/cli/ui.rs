//! Terminal rendering of workflow feedback: notifications, navigations and the
//! device consent prompt.

use crate::mockmate::{
    auth::{Navigator, Notification, NotificationLevel, Notifier, Route},
    client::ConsentPrompt,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Command that shows a route in the CLI.
#[must_use]
pub const fn route_command(route: Route) -> &'static str {
    match route {
        Route::Home => "mockmate dashboard",
        Route::SignIn => "mockmate sign-in",
        Route::SignUp => "mockmate sign-up",
        Route::Interview => "mockmate interview",
        Route::Profile => "mockmate profile",
    }
}

#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => println!("✔ {}", notification.message),
            NotificationLevel::Error => eprintln!("✖ {}", notification.message),
        }
    }
}

/// Prints where to go next and remembers the last route.
#[derive(Debug, Default)]
pub struct TerminalNavigator {
    last: Mutex<Option<Route>>,
}

impl TerminalNavigator {
    #[must_use]
    pub fn last_route(&self) -> Option<Route> {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: Route) {
        debug!(route = route.path(), "navigate");
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(route);
        println!("→ next: {}", route_command(route));
    }
}

#[derive(Debug, Default)]
pub struct ConsoleConsentPrompt;

impl ConsentPrompt for ConsoleConsentPrompt {
    fn show(&self, verification_uri: &str, user_code: &str) {
        println!("\nOpen this URL in your browser:");
        println!("  {verification_uri}");
        println!("  Code: {user_code}\n");

        if open::that(verification_uri).is_ok() {
            println!("Browser opened automatically.\n");
        }
        println!("Waiting for authorization...");
    }
}

/// Uses the given password or asks for one without echo.
///
/// # Errors
/// Fails when the terminal cannot be read.
pub async fn password_or_prompt(password: Option<SecretString>) -> Result<SecretString> {
    if let Some(password) = password {
        return Ok(password);
    }

    tokio::task::spawn_blocking(|| rpassword::prompt_password("Password: "))
        .await
        .context("password prompt was interrupted")?
        .map(SecretString::from)
        .context("unable to read password")
}
