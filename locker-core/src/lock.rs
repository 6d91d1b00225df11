//! Lock surface: the page overlay and its verification state machine.
//!
//! ```text
//! Unlocked --(page load, config complete)--> Locked --(match / assertion)--> Unlocked
//! ```
//!
//! The overlay is engaged at most once per page load and, once unlocked, stays
//! unlocked. Failures only change the inline message (and, for patterns, reset
//! the grid); the overlay itself is never torn down and rebuilt.

use tracing::{debug, info, warn};

use crate::authenticator::{Assertion, AuthenticatorConfig, PlatformAuthenticator};
use crate::digest::{digest, digest_matches};
use crate::error::{AssertionError, Result};
use crate::method::{InputKind, UnlockMethod};
use crate::pattern::PatternGrid;
use crate::storage::{KeyValueStore, LockerConfig, SyncSettings};

/// Message shown when a platform assertion is rejected.
pub const FINGERPRINT_FAILED: &str = "Fingerprint authentication failed.";

/// Method-specific controls rendered inside the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayControls {
    /// Single text field plus an "Unlock" button.
    TextEntry {
        input: InputKind,
        placeholder: &'static str,
    },
    /// 3x3 click grid plus an "Unlock" button.
    PatternGrid,
    /// Single "Authenticate" button.
    Authenticate,
}

/// Result of feeding one event to the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Credential accepted; the overlay is gone.
    Unlocked,
    /// Credential refused; the message was updated.
    Rejected,
    /// Event did not apply (already unlocked, wrong control, null assertion).
    Unchanged,
}

/// Locked overlay for one page.
#[derive(Debug, Clone)]
pub struct LockOverlay {
    method_name: String,
    method: UnlockMethod,
    stored_digest: String,
    grid: PatternGrid,
    message: String,
    locked: bool,
}

impl LockOverlay {
    /// Engage the overlay if the configuration is complete.
    ///
    /// Returns `None` (page stays unlocked) unless `active` is set and both a
    /// method and a digest are present.
    #[must_use]
    pub fn engage(config: &LockerConfig) -> Option<Self> {
        if !config.is_complete() {
            return None;
        }
        let method_name = config.method.clone()?;
        let stored_digest = config.digest_hex.clone()?;
        Some(Self {
            method: UnlockMethod::for_overlay(&method_name),
            method_name,
            stored_digest,
            grid: PatternGrid::new(),
            message: String::new(),
            locked: true,
        })
    }

    /// Method whose controls are rendered (unknown names resolve to password).
    #[must_use]
    pub const fn method(&self) -> UnlockMethod {
        self.method
    }

    /// Method name exactly as stored.
    #[must_use]
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    #[must_use]
    pub const fn heading(&self) -> &'static str {
        self.method.heading()
    }

    #[must_use]
    pub fn controls(&self) -> OverlayControls {
        match self.method {
            UnlockMethod::Pattern => OverlayControls::PatternGrid,
            UnlockMethod::Fingerprint => OverlayControls::Authenticate,
            UnlockMethod::Password | UnlockMethod::Pin => OverlayControls::TextEntry {
                input: self.method.input_kind().unwrap_or(InputKind::Password),
                placeholder: self.method.overlay_placeholder().unwrap_or("Password"),
            },
        }
    }

    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    /// Inline status message; empty until the first failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Pattern entered so far.
    #[must_use]
    pub const fn pattern(&self) -> &PatternGrid {
        &self.grid
    }

    /// Click a pattern cell. Ignored outside pattern mode or once unlocked.
    pub fn select_cell(&mut self, index: usize) -> Result<bool> {
        if !self.locked || self.method != UnlockMethod::Pattern {
            return Ok(false);
        }
        self.grid.select(index)
    }

    /// Verify a password/PIN attempt against the digest captured at engage time.
    pub fn submit_text(&mut self, attempt: &str) -> Outcome {
        let stored = self.stored_digest.clone();
        self.verify_text(attempt, Some(&stored))
    }

    /// Verify a password/PIN attempt against `stored_digest`.
    ///
    /// The attempt is digested as typed, without trimming. A missing stored
    /// digest never matches.
    pub fn verify_text(&mut self, attempt: &str, stored_digest: Option<&str>) -> Outcome {
        if !self.locked || !matches!(self.controls(), OverlayControls::TextEntry { .. }) {
            return Outcome::Unchanged;
        }
        if Self::matches(&digest(attempt), stored_digest) {
            self.unlock();
            return Outcome::Unlocked;
        }
        self.reject();
        Outcome::Rejected
    }

    /// Verify the selected pattern against the digest captured at engage time.
    pub fn submit_pattern(&mut self) -> Outcome {
        let stored = self.stored_digest.clone();
        self.verify_pattern(Some(&stored))
    }

    /// Verify the selected pattern against `stored_digest`.
    ///
    /// The grid is cleared either way; on failure the user starts over.
    pub fn verify_pattern(&mut self, stored_digest: Option<&str>) -> Outcome {
        if !self.locked || self.method != UnlockMethod::Pattern {
            return Outcome::Unchanged;
        }
        let attempt = digest(&self.grid.canonical());
        self.grid.clear();
        if Self::matches(&attempt, stored_digest) {
            self.unlock();
            return Outcome::Unlocked;
        }
        self.reject();
        Outcome::Rejected
    }

    /// Apply the completion of a platform assertion call.
    ///
    /// The stored digest is not consulted: a non-null assertion alone unlocks.
    pub fn apply_assertion(
        &mut self,
        result: std::result::Result<Option<Assertion>, AssertionError>,
    ) -> Outcome {
        if !self.locked || self.method != UnlockMethod::Fingerprint {
            return Outcome::Unchanged;
        }
        match result {
            Ok(Some(_)) => {
                self.unlock();
                Outcome::Unlocked
            }
            Ok(None) => Outcome::Unchanged,
            Err(e) => {
                debug!(error = %e, "fingerprint assertion failed");
                FINGERPRINT_FAILED.clone_into(&mut self.message);
                Outcome::Rejected
            }
        }
    }

    fn matches(attempt_hex: &str, stored_digest: Option<&str>) -> bool {
        stored_digest.is_some_and(|stored| digest_matches(attempt_hex, stored))
    }

    fn unlock(&mut self) {
        self.locked = false;
        self.grid.clear();
        info!(method = %self.method_name, "overlay unlocked");
    }

    fn reject(&mut self) {
        self.message = format!("Incorrect {}. Try again.", self.method_name);
        debug!(method = %self.method_name, "unlock attempt rejected");
    }
}

/// Lock surface driver: reads the sync store and runs the assertion call.
pub struct LockSurface<K, A> {
    settings: SyncSettings<K>,
    authenticator: A,
    config: AuthenticatorConfig,
}

impl<K: KeyValueStore, A: PlatformAuthenticator> LockSurface<K, A> {
    pub fn new(store: K, authenticator: A) -> Self {
        Self {
            settings: SyncSettings::new(store),
            authenticator,
            config: AuthenticatorConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: AuthenticatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Page-load guard. Fails open: a store error or incomplete configuration
    /// leaves the page unlocked.
    pub async fn on_page_load(&self) -> Option<LockOverlay> {
        let config = match self.settings.load_config().await {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "could not read locker configuration, page left unlocked");
                return None;
            }
        };
        let overlay = LockOverlay::engage(&config)?;
        info!(method = %overlay.method_name(), "overlay engaged");
        Some(overlay)
    }

    /// Submit a password/PIN attempt, re-reading the stored digest first.
    pub async fn submit_text(&self, overlay: &mut LockOverlay, attempt: &str) -> Result<Outcome> {
        if !overlay.is_locked() {
            return Ok(Outcome::Unchanged);
        }
        let stored = self.settings.load_digest().await?;
        Ok(overlay.verify_text(attempt, stored.as_deref()))
    }

    /// Submit the selected pattern, re-reading the stored digest first.
    pub async fn submit_pattern(&self, overlay: &mut LockOverlay) -> Result<Outcome> {
        if !overlay.is_locked() {
            return Ok(Outcome::Unchanged);
        }
        let stored = self.settings.load_digest().await?;
        Ok(overlay.verify_pattern(stored.as_deref()))
    }

    /// "Authenticate" click: one assertion call with the lock challenge.
    pub async fn authenticate(&self, overlay: &mut LockOverlay) -> Outcome {
        if !overlay.is_locked() || overlay.method() != UnlockMethod::Fingerprint {
            return Outcome::Unchanged;
        }
        let result = self
            .authenticator
            .get_assertion(&self.config.lock_request())
            .await;
        overlay.apply_assertion(result)
    }

    pub fn settings(&self) -> &SyncSettings<K> {
        &self.settings
    }
}
