//! Unlock methods and their per-method presentation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LockerError;

/// How the lock surface verifies the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnlockMethod {
    /// Free text, hidden input.
    Password,
    /// Digits only at save time, numeric input.
    Pin,
    /// Ordered clicks on a 3x3 grid.
    Pattern,
    /// Platform biometric assertion.
    Fingerprint,
}

/// Kind of text input a control renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Masked text.
    Password,
    /// Numeric keypad.
    Number,
    /// Revealed plain text.
    Text,
}

impl InputKind {
    /// HTML `type` attribute value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::Number => "number",
            Self::Text => "text",
        }
    }
}

impl UnlockMethod {
    /// Every method, in selector order.
    pub const ALL: [Self; 4] = [Self::Password, Self::Pin, Self::Pattern, Self::Fingerprint];

    /// Stored name of the method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::Pin => "pin",
            Self::Pattern => "pattern",
            Self::Fingerprint => "fingerprint",
        }
    }

    /// Resolve a stored method name for rendering the overlay.
    ///
    /// Unrecognized names fall back to the password controls.
    #[must_use]
    pub fn for_overlay(raw: &str) -> Self {
        raw.parse().unwrap_or(Self::Password)
    }

    /// Overlay heading.
    #[must_use]
    pub const fn heading(&self) -> &'static str {
        match self {
            Self::Password => "Enter Password",
            Self::Pin => "Enter PIN",
            Self::Pattern => "Draw Pattern",
            Self::Fingerprint => "Fingerprint Authentication",
        }
    }

    /// Input kind for text entry, `None` for methods without a text field.
    #[must_use]
    pub const fn input_kind(&self) -> Option<InputKind> {
        match self {
            Self::Password => Some(InputKind::Password),
            Self::Pin => Some(InputKind::Number),
            Self::Pattern | Self::Fingerprint => None,
        }
    }

    /// Placeholder for the overlay's single text field.
    #[must_use]
    pub const fn overlay_placeholder(&self) -> Option<&'static str> {
        match self {
            Self::Password => Some("Password"),
            Self::Pin => Some("PIN"),
            Self::Pattern | Self::Fingerprint => None,
        }
    }

    /// Placeholders for the setup surface's new/confirm fields.
    #[must_use]
    pub const fn setup_placeholders(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Password => Some(("Set Password", "Confirm Password")),
            Self::Pin => Some((
                "Set PIN (Only numbers are taken)",
                "Confirm PIN (Only numbers are taken)",
            )),
            Self::Pattern | Self::Fingerprint => None,
        }
    }
}

impl FromStr for UnlockMethod {
    type Err = LockerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| LockerError::UnknownMethod(s.to_string()))
    }
}

impl fmt::Display for UnlockMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
