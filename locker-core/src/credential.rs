//! Canonical credential strings and save-time validation.
//!
//! Each method has exactly one canonical string that gets digested:
//!
//! | method      | canonical string                      |
//! |-------------|---------------------------------------|
//! | password    | the text as entered (trimmed at save) |
//! | pin         | the digits as entered (trimmed)       |
//! | pattern     | comma-joined cell indices             |
//! | fingerprint | the literal `fingerprint`             |

use zeroize::Zeroizing;

use crate::digest::digest;
use crate::error::ValidationError;
use crate::method::UnlockMethod;
use crate::pattern::PatternGrid;

/// Canonical string used for the fingerprint method.
///
/// Carries no biometric information; the platform assertion is the real gate.
pub const FINGERPRINT_CANONICAL: &str = "fingerprint";

/// Raw setup input for one save attempt.
#[derive(Debug, Clone, Copy)]
pub enum CredentialInput<'a> {
    Password { new: &'a str, confirm: &'a str },
    Pin { new: &'a str, confirm: &'a str },
    Pattern(&'a PatternGrid),
    Fingerprint { registered: bool },
}

impl CredentialInput<'_> {
    #[must_use]
    pub const fn method(&self) -> UnlockMethod {
        match self {
            Self::Password { .. } => UnlockMethod::Password,
            Self::Pin { .. } => UnlockMethod::Pin,
            Self::Pattern(_) => UnlockMethod::Pattern,
            Self::Fingerprint { .. } => UnlockMethod::Fingerprint,
        }
    }
}

/// A validated credential ready to be digested and stored.
#[derive(Clone)]
pub struct CanonicalCredential {
    method: UnlockMethod,
    canonical: Zeroizing<String>,
}

impl std::fmt::Debug for CanonicalCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanonicalCredential")
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

impl CanonicalCredential {
    #[must_use]
    pub const fn method(&self) -> UnlockMethod {
        self.method
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// Hex digest of the canonical string.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        digest(&self.canonical)
    }
}

/// `^\d+$` with ASCII digits.
#[must_use]
pub fn is_numeric_pin(pin: &str) -> bool {
    !pin.is_empty() && pin.bytes().all(|b| b.is_ascii_digit())
}

/// Validate setup input and build its canonical credential.
pub fn canonical_credential(
    input: CredentialInput<'_>,
) -> Result<CanonicalCredential, ValidationError> {
    let canonical = match input {
        CredentialInput::Password { new, confirm } => {
            let (new, confirm) = (new.trim(), confirm.trim());
            if new.is_empty() {
                return Err(ValidationError::EmptyPassword);
            }
            if new != confirm {
                return Err(ValidationError::PasswordMismatch);
            }
            new.to_string()
        }
        CredentialInput::Pin { new, confirm } => {
            let (new, confirm) = (new.trim(), confirm.trim());
            if !is_numeric_pin(new) {
                return Err(ValidationError::NonNumericPin);
            }
            if new != confirm {
                return Err(ValidationError::PinMismatch);
            }
            new.to_string()
        }
        CredentialInput::Pattern(grid) => {
            if grid.is_empty() {
                return Err(ValidationError::EmptyPattern);
            }
            grid.canonical()
        }
        CredentialInput::Fingerprint { registered } => {
            if !registered {
                return Err(ValidationError::FingerprintNotRegistered);
            }
            FINGERPRINT_CANONICAL.to_string()
        }
    };

    Ok(CanonicalCredential {
        method: input.method(),
        canonical: Zeroizing::new(canonical),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pin(new: &str, confirm: &str) -> Result<CanonicalCredential, ValidationError> {
        canonical_credential(CredentialInput::Pin { new, confirm })
    }

    #[test]
    fn test_password_rules() {
        let ok = canonical_credential(CredentialInput::Password {
            new: "hunter2",
            confirm: "hunter2",
        })
        .unwrap();
        assert_eq!(ok.method(), UnlockMethod::Password);
        assert_eq!(ok.as_str(), "hunter2");

        let empty = canonical_credential(CredentialInput::Password { new: "   ", confirm: "" });
        assert_eq!(empty.unwrap_err(), ValidationError::EmptyPassword);

        let mismatch = canonical_credential(CredentialInput::Password {
            new: "hunter2",
            confirm: "hunter3",
        });
        assert_eq!(mismatch.unwrap_err(), ValidationError::PasswordMismatch);
    }

    #[test]
    fn test_password_trimmed() {
        let ok = canonical_credential(CredentialInput::Password {
            new: "  hunter2 ",
            confirm: "hunter2",
        })
        .unwrap();
        assert_eq!(ok.as_str(), "hunter2");
    }

    #[test]
    fn test_pin_rules() {
        assert_eq!(pin("12a4", "12a4").unwrap_err(), ValidationError::NonNumericPin);
        assert_eq!(pin("", "").unwrap_err(), ValidationError::NonNumericPin);
        assert_eq!(pin("-12", "-12").unwrap_err(), ValidationError::NonNumericPin);
        assert_eq!(pin("1234", "1235").unwrap_err(), ValidationError::PinMismatch);
        assert_eq!(pin("1234", "1234").unwrap().as_str(), "1234");
        assert_eq!(pin("0042", "0042").unwrap().as_str(), "0042");
    }

    #[test]
    fn test_pin_digits_are_ascii() {
        assert!(!is_numeric_pin("١٢٣"));
        assert!(is_numeric_pin("0123456789"));
    }

    #[test]
    fn test_pattern_rules() {
        let mut grid = PatternGrid::new();
        let empty = canonical_credential(CredentialInput::Pattern(&grid));
        assert_eq!(empty.unwrap_err(), ValidationError::EmptyPattern);

        grid.select(0).unwrap();
        grid.select(1).unwrap();
        grid.select(2).unwrap();
        let ok = canonical_credential(CredentialInput::Pattern(&grid)).unwrap();
        assert_eq!(ok.as_str(), "0,1,2");
    }

    #[test]
    fn test_fingerprint_rules() {
        let missing = canonical_credential(CredentialInput::Fingerprint { registered: false });
        assert_eq!(missing.unwrap_err(), ValidationError::FingerprintNotRegistered);

        let ok = canonical_credential(CredentialInput::Fingerprint { registered: true }).unwrap();
        assert_eq!(ok.as_str(), FINGERPRINT_CANONICAL);
        assert_eq!(ok.digest_hex(), digest("fingerprint"));
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(ValidationError::PinMismatch.to_string(), "Incorrect PIN.");
        assert_eq!(
            ValidationError::FingerprintNotRegistered.to_string(),
            "Please register your fingerprint first."
        );
    }

    #[test]
    fn test_debug_hides_secret() {
        let ok = pin("9999", "9999").unwrap();
        assert!(!format!("{ok:?}").contains("9999"));
    }
}
