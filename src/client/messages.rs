//! Maps errors to the text shown to the user.
//!
//! The server reports business failures as `{message}` strings. Known strings
//! are translated; anything else falls back to a generic message for the
//! operation so raw server wording never reaches a toast.

use crate::client::error::ApiError;

pub const GENERIC_ERROR: &str = "An unexpected error occurred";
pub const SESSION_EXPIRED: &str = "Your session has expired. Please sign in again";

const KNOWN_MESSAGES: &[(&str, &str)] = &[
    ("Invalid credentials", "Invalid e-mail or password"),
    ("E-mail already exists!", "This e-mail is already registered"),
    ("User already exists", "This user already exists"),
    ("Email already in use", "This e-mail is already in use"),
    ("Validation failed", "Invalid data"),
    ("Network Error", "Connection error. Check your internet connection"),
    ("Current password is incorrect", "Current password is incorrect"),
    ("Invalid current password", "Current password is invalid"),
];

/// Operation an error happened in; picks the fallback text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorContext {
    General,
    Login,
    Register,
    ChangePassword,
    CreateMonster,
    Logout,
}

impl ErrorContext {
    fn fallback(&self) -> &'static str {
        match self {
            ErrorContext::General => GENERIC_ERROR,
            ErrorContext::Login => "Could not sign in. Try again",
            ErrorContext::Register => "Could not create the account. Try again",
            ErrorContext::ChangePassword => "Could not change the password. Try again",
            ErrorContext::CreateMonster => "Could not create the monster. Try again",
            ErrorContext::Logout => "Could not sign out. Try again",
        }
    }
}

/// Translation of a known server message
pub fn translate(message: &str) -> Option<&'static str> {
    KNOWN_MESSAGES
        .iter()
        .find(|(known, _)| *known == message)
        .map(|(_, text)| *text)
}

/// User-facing text for an error raised during `context`
pub fn user_message(error: &ApiError, context: ErrorContext) -> String {
    let text = match error {
        ApiError::Network { .. } => translate("Network Error"),
        ApiError::Timeout => Some("The server took too long to respond"),
        ApiError::Validation { .. } => Some("Please fix the highlighted fields"),
        _ => error.server_message().and_then(translate),
    };
    text.unwrap_or_else(|| context.fallback()).to_string()
}
