//! # Locker Core
//!
//! Credential verification and overlay lifecycle for the page locker.
//!
//! Two surfaces share one data contract through a cross-device sync store:
//!
//! - the **setup surface** ([`SetupSurface`]) registers a password, PIN,
//!   pattern or fingerprint and toggles the lock;
//! - the **lock surface** ([`LockSurface`] / [`LockOverlay`]) covers the page on
//!   load and removes the overlay once a matching credential is supplied.
//!
//! Credentials are compared as unsalted SHA-256 hex digests ([`digest()`]) of a
//! per-method canonical string. The fingerprint method relies solely on the
//! platform assertion succeeding; its stored digest is never checked.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use locker_core::{LockSurface, MemoryStore, NoAuthenticator, Outcome, SetupSurface};
//!
//! # tokio_test();
//! # fn tokio_test() {
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let sync = Arc::new(MemoryStore::new());
//!
//! let mut setup = SetupSurface::new(sync.clone(), MemoryStore::new(), NoAuthenticator);
//! setup.set_new_credential("hunter2");
//! setup.set_confirm_credential("hunter2");
//! setup.save().await.unwrap();
//! setup.toggle_active(true).await.unwrap();
//!
//! let lock = LockSurface::new(sync, NoAuthenticator);
//! let mut overlay = lock.on_page_load().await.expect("locked");
//! assert_eq!(lock.submit_text(&mut overlay, "hunter2").await.unwrap(), Outcome::Unlocked);
//! # });
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return `Result<T, LockerError>`. Common errors:
//! - [`LockerError::Validation`] - setup input rejected; its text is the status message
//! - [`LockerError::Assertion`] - platform assertion rejected or unavailable
//! - [`LockerError::Store`] - sync or local store failure
//!
//! An incomplete configuration is not an error: the page simply stays unlocked.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
// Error docs are centralized above; individual function docs are concise
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

pub mod authenticator;
pub mod credential;
pub mod digest;
mod error;
pub mod lock;
pub mod method;
pub mod pattern;
pub mod setup;
pub mod storage;

pub use authenticator::{
    Assertion, AssertionRequest, AuthenticatorConfig, NoAuthenticator, PlatformAuthenticator,
    ScriptedAuthenticator, UserVerification,
};
pub use credential::{canonical_credential, CanonicalCredential, CredentialInput};
pub use digest::{digest, digest_matches, DIGEST_HEX_LEN};
pub use error::{AssertionError, LockerError, Result, StoreError, ValidationError};
pub use lock::{LockOverlay, LockSurface, OverlayControls, Outcome};
pub use method::{InputKind, UnlockMethod};
pub use pattern::PatternGrid;
pub use setup::{Field, SetupControls, SetupForm, SetupSurface};
pub use storage::{
    JsonFileStore, KeyValueStore, LocalStorage, LockerConfig, MemoryStore, SyncSettings,
};
