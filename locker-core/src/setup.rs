//! Setup surface: choose a method, register a credential, toggle the lock.

use tracing::{debug, info};
use zeroize::{Zeroize, Zeroizing};

use crate::authenticator::{AuthenticatorConfig, PlatformAuthenticator};
use crate::credential::{canonical_credential, CanonicalCredential, CredentialInput};
use crate::error::{LockerError, Result, ValidationError};
use crate::method::{InputKind, UnlockMethod};
use crate::pattern::PatternGrid;
use crate::storage::{
    fingerprint_registered, mark_fingerprint_registered, KeyValueStore, LocalStorage,
    SyncSettings,
};

/// Status after a successful save.
pub const SAVED: &str = "Credential saved successfully!";
/// Status after a successful fingerprint registration.
pub const FINGERPRINT_REGISTERED: &str = "Fingerprint registered successfully!";
/// Status after a failed fingerprint registration.
pub const FINGERPRINT_REGISTRATION_FAILED: &str = "Fingerprint registration failed.";

/// One of the two credential text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    New,
    Confirm,
}

/// Method-specific controls shown by the setup surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupControls {
    TextFields {
        input: InputKind,
        new_placeholder: &'static str,
        confirm_placeholder: &'static str,
    },
    PatternGrid,
    FingerprintRegistration,
}

/// Setup form state: selected method and its transient input buffers.
///
/// Pure state with no storage access; [`SetupSurface`] drives it against the
/// stores, the browser bindings drive it from DOM events. Buffers are wiped
/// whenever the method changes.
pub struct SetupForm {
    available: Vec<UnlockMethod>,
    selected: UnlockMethod,
    new_credential: Zeroizing<String>,
    confirm_credential: Zeroizing<String>,
    reveal: [bool; 2],
    grid: PatternGrid,
    status: String,
}

impl std::fmt::Debug for SetupForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetupForm")
            .field("selected", &self.selected)
            .field("pattern_len", &self.grid.sequence().len())
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl Default for SetupForm {
    fn default() -> Self {
        Self::new()
    }
}

impl SetupForm {
    /// Form offering every method, password selected.
    #[must_use]
    pub fn new() -> Self {
        Self {
            available: UnlockMethod::ALL.to_vec(),
            selected: UnlockMethod::Password,
            new_credential: Zeroizing::default(),
            confirm_credential: Zeroizing::default(),
            reveal: [false; 2],
            grid: PatternGrid::new(),
            status: String::new(),
        }
    }

    /// Stop offering fingerprint (no platform authenticator on this device).
    pub fn hide_fingerprint(&mut self) {
        self.available.retain(|m| *m != UnlockMethod::Fingerprint);
    }

    /// Methods offered by the selector.
    #[must_use]
    pub fn available_methods(&self) -> &[UnlockMethod] {
        &self.available
    }

    #[must_use]
    pub const fn selected_method(&self) -> UnlockMethod {
        self.selected
    }

    /// Switch method. Returns `false` (nothing cleared) if it is already selected.
    pub fn select_method(&mut self, method: UnlockMethod) -> Result<bool> {
        if !self.available.contains(&method) {
            return Err(LockerError::MethodUnavailable(method.to_string()));
        }
        if method == self.selected {
            return Ok(false);
        }
        self.status.clear();
        self.new_credential.zeroize();
        self.confirm_credential.zeroize();
        self.reveal = [false; 2];
        self.grid.clear();
        self.selected = method;
        Ok(true)
    }

    #[must_use]
    pub fn controls(&self) -> SetupControls {
        match (self.selected, self.selected.setup_placeholders()) {
            (UnlockMethod::Pattern, _) => SetupControls::PatternGrid,
            (UnlockMethod::Fingerprint, _) => SetupControls::FingerprintRegistration,
            (method, placeholders) => {
                let (new_placeholder, confirm_placeholder) =
                    placeholders.unwrap_or(("Set Password", "Confirm Password"));
                SetupControls::TextFields {
                    input: method.input_kind().unwrap_or(InputKind::Password),
                    new_placeholder,
                    confirm_placeholder,
                }
            }
        }
    }

    pub fn set_new_credential(&mut self, value: &str) {
        self.new_credential.zeroize();
        self.new_credential.push_str(value);
    }

    pub fn set_confirm_credential(&mut self, value: &str) {
        self.confirm_credential.zeroize();
        self.confirm_credential.push_str(value);
    }

    /// Current input kind of a text field.
    #[must_use]
    pub fn field_kind(&self, field: Field) -> InputKind {
        if self.reveal[field as usize] {
            InputKind::Text
        } else {
            self.selected.input_kind().unwrap_or(InputKind::Password)
        }
    }

    /// Eye toggle: reveal or re-mask a text field. Returns the new input kind.
    pub fn toggle_visibility(&mut self, field: Field) -> InputKind {
        self.reveal[field as usize] = !self.reveal[field as usize];
        self.field_kind(field)
    }

    /// Click a pattern cell. Ignored outside pattern mode.
    pub fn select_cell(&mut self, index: usize) -> Result<bool> {
        if self.selected != UnlockMethod::Pattern {
            return Ok(false);
        }
        self.grid.select(index)
    }

    #[must_use]
    pub const fn pattern(&self) -> &PatternGrid {
        &self.grid
    }

    /// Validate the current input for the selected method.
    ///
    /// On failure the status line is set to the validation message.
    pub fn credential(
        &mut self,
        fingerprint_registered: bool,
    ) -> std::result::Result<CanonicalCredential, ValidationError> {
        let input = match self.selected {
            UnlockMethod::Password => CredentialInput::Password {
                new: &self.new_credential,
                confirm: &self.confirm_credential,
            },
            UnlockMethod::Pin => CredentialInput::Pin {
                new: &self.new_credential,
                confirm: &self.confirm_credential,
            },
            UnlockMethod::Pattern => CredentialInput::Pattern(&self.grid),
            UnlockMethod::Fingerprint => CredentialInput::Fingerprint {
                registered: fingerprint_registered,
            },
        };
        canonical_credential(input).map_err(|e| {
            self.status = e.to_string();
            debug!(method = %self.selected, reason = %e, "credential rejected");
            e
        })
    }

    /// Inline status text.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: &str) {
        status.clone_into(&mut self.status);
    }
}

/// Setup surface: a [`SetupForm`] wired to the sync store, local storage and
/// platform authenticator.
pub struct SetupSurface<K, L, A> {
    settings: SyncSettings<K>,
    local: L,
    authenticator: A,
    config: AuthenticatorConfig,
    form: SetupForm,
    active: bool,
}

impl<K, L, A> SetupSurface<K, L, A>
where
    K: KeyValueStore,
    L: LocalStorage,
    A: PlatformAuthenticator,
{
    pub fn new(store: K, local: L, authenticator: A) -> Self {
        Self {
            settings: SyncSettings::new(store),
            local,
            authenticator,
            config: AuthenticatorConfig::default(),
            form: SetupForm::new(),
            active: false,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: AuthenticatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Load the checkbox state and probe for a platform authenticator.
    ///
    /// Without one, fingerprint is not offered.
    pub async fn open(&mut self) -> Result<()> {
        self.active = self.settings.load_active().await?;
        if !self.authenticator.is_available().await {
            debug!("no platform authenticator, fingerprint method hidden");
            self.form.hide_fingerprint();
        }
        Ok(())
    }

    #[must_use]
    pub fn form(&self) -> &SetupForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut SetupForm {
        &mut self.form
    }

    #[must_use]
    pub fn available_methods(&self) -> &[UnlockMethod] {
        self.form.available_methods()
    }

    pub fn select_method(&mut self, method: UnlockMethod) -> Result<bool> {
        self.form.select_method(method)
    }

    #[must_use]
    pub fn controls(&self) -> SetupControls {
        self.form.controls()
    }

    pub fn set_new_credential(&mut self, value: &str) {
        self.form.set_new_credential(value);
    }

    pub fn set_confirm_credential(&mut self, value: &str) {
        self.form.set_confirm_credential(value);
    }

    pub fn select_cell(&mut self, index: usize) -> Result<bool> {
        self.form.select_cell(index)
    }

    /// Validate the current input and persist `{credentialHash, unlockMethod}`.
    ///
    /// On a validation failure the status shows the reason and nothing is written.
    /// The activation flag is never touched.
    pub async fn save(&mut self) -> Result<()> {
        let registered = match self.form.selected_method() {
            UnlockMethod::Fingerprint => fingerprint_registered(&self.local)?,
            _ => false,
        };
        let credential = self.form.credential(registered)?;

        self.settings
            .save_credential(credential.method(), &credential.digest_hex())
            .await?;
        self.form.set_status(SAVED);
        info!(method = %credential.method(), "credential saved");
        Ok(())
    }

    /// Run one assertion with the registration challenge.
    ///
    /// Returns `Ok(true)` once registered, `Ok(false)` on a null result.
    pub async fn register_fingerprint(&mut self) -> Result<bool> {
        let result = self
            .authenticator
            .get_assertion(&self.config.register_request())
            .await;
        match result {
            Ok(Some(_)) => {
                if let Err(e) = mark_fingerprint_registered(&self.local) {
                    self.form.set_status(FINGERPRINT_REGISTRATION_FAILED);
                    return Err(e.into());
                }
                self.form.set_status(FINGERPRINT_REGISTERED);
                info!("fingerprint registered on this device");
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) => {
                self.form.set_status(FINGERPRINT_REGISTRATION_FAILED);
                debug!(error = %e, "fingerprint registration failed");
                Err(e.into())
            }
        }
    }

    /// Checkbox change: write `lockerActive` as given, no other checks.
    pub async fn toggle_active(&mut self, active: bool) -> Result<()> {
        self.settings.set_active(active).await?;
        self.active = active;
        info!(active, "locker activation changed");
        Ok(())
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Inline status text.
    #[must_use]
    pub fn status(&self) -> &str {
        self.form.status()
    }

    pub fn settings(&self) -> &SyncSettings<K> {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authenticator::{NoAuthenticator, ScriptedAuthenticator};
    use crate::digest::digest;
    use crate::lock::{LockSurface, Outcome};
    use crate::storage::{MemoryStore, KEY_ACTIVE};
    use std::sync::Arc;

    type TestSetup = SetupSurface<Arc<MemoryStore>, MemoryStore, Arc<ScriptedAuthenticator>>;

    fn surface(sync: &Arc<MemoryStore>, auth: ScriptedAuthenticator) -> TestSetup {
        SetupSurface::new(sync.clone(), MemoryStore::new(), Arc::new(auth))
    }

    #[tokio::test]
    async fn test_open_reads_active_and_availability() {
        let sync = Arc::new(MemoryStore::new());
        SyncSettings::new(sync.clone()).set_active(true).await.unwrap();

        let mut setup = SetupSurface::new(sync.clone(), MemoryStore::new(), NoAuthenticator);
        setup.open().await.unwrap();
        assert!(setup.is_active());
        assert!(!setup.available_methods().contains(&UnlockMethod::Fingerprint));
        assert!(matches!(
            setup.select_method(UnlockMethod::Fingerprint),
            Err(LockerError::MethodUnavailable(_))
        ));

        let mut with_sensor = surface(&Arc::new(MemoryStore::new()), ScriptedAuthenticator::new(true));
        with_sensor.open().await.unwrap();
        assert!(!with_sensor.is_active());
        assert_eq!(with_sensor.available_methods().len(), 4);
    }

    #[tokio::test]
    async fn test_select_method_clears_buffers() {
        let sync = Arc::new(MemoryStore::new());
        let mut setup = surface(&sync, ScriptedAuthenticator::new(true));
        setup.set_new_credential("abc");
        setup.save().await.unwrap_err();
        assert_eq!(setup.status(), "Passwords do not match.");

        // Same method: nothing cleared.
        assert!(!setup.select_method(UnlockMethod::Password).unwrap());
        assert_eq!(setup.status(), "Passwords do not match.");

        assert!(setup.select_method(UnlockMethod::Pattern).unwrap());
        assert_eq!(setup.status(), "");
        assert_eq!(setup.controls(), SetupControls::PatternGrid);
        setup.select_cell(3).unwrap();

        assert!(setup.select_method(UnlockMethod::Pin).unwrap());
        assert!(setup.form().pattern().is_empty());
        setup.set_confirm_credential("1234");
        // New field was wiped by the switch, so the PIN is empty.
        let err = setup.save().await.unwrap_err();
        assert!(matches!(err, LockerError::Validation(ValidationError::NonNumericPin)));
    }

    #[tokio::test]
    async fn test_pin_validation() {
        let sync = Arc::new(MemoryStore::new());
        let mut setup = surface(&sync, ScriptedAuthenticator::new(true));
        setup.select_method(UnlockMethod::Pin).unwrap();

        setup.set_new_credential("12a4");
        setup.set_confirm_credential("12a4");
        assert!(setup.save().await.is_err());
        assert_eq!(setup.status(), "Only numbers are taken.");

        setup.set_new_credential("1234");
        setup.set_confirm_credential("1235");
        assert!(setup.save().await.is_err());
        assert_eq!(setup.status(), "Incorrect PIN.");
        assert!(sync.snapshot().unwrap().is_empty());

        setup.set_confirm_credential("1234");
        setup.save().await.unwrap();
        assert_eq!(setup.status(), SAVED);

        let cfg = setup.settings().load_config().await.unwrap();
        assert_eq!(cfg.method.as_deref(), Some("pin"));
        assert_eq!(cfg.digest_hex, Some(digest("1234")));
        assert!(!cfg.active);
    }

    #[tokio::test]
    async fn test_pattern_requires_cells() {
        let sync = Arc::new(MemoryStore::new());
        let mut setup = surface(&sync, ScriptedAuthenticator::new(true));
        setup.select_method(UnlockMethod::Pattern).unwrap();
        assert!(setup.save().await.is_err());
        assert_eq!(setup.status(), "Please draw your pattern.");

        for i in [6, 4, 2] {
            setup.select_cell(i).unwrap();
        }
        setup.save().await.unwrap();
        assert_eq!(
            setup.settings().load_digest().await.unwrap(),
            Some(digest("6,4,2"))
        );
    }

    #[tokio::test]
    async fn test_fingerprint_requires_registration() {
        let sync = Arc::new(MemoryStore::new());
        let auth = ScriptedAuthenticator::new(true)
            .then_reject("NotAllowedError")
            .then(Ok(None))
            .then_succeed();
        let mut setup = surface(&sync, auth);
        setup.select_method(UnlockMethod::Fingerprint).unwrap();
        assert_eq!(setup.controls(), SetupControls::FingerprintRegistration);

        assert!(setup.save().await.is_err());
        assert_eq!(setup.status(), "Please register your fingerprint first.");

        assert!(setup.register_fingerprint().await.is_err());
        assert_eq!(setup.status(), FINGERPRINT_REGISTRATION_FAILED);

        assert!(!setup.register_fingerprint().await.unwrap());
        assert_eq!(setup.status(), FINGERPRINT_REGISTRATION_FAILED);

        assert!(setup.register_fingerprint().await.unwrap());
        assert_eq!(setup.status(), FINGERPRINT_REGISTERED);

        setup.save().await.unwrap();
        assert_eq!(
            setup.settings().load_digest().await.unwrap(),
            Some(digest("fingerprint"))
        );
    }

    #[tokio::test]
    async fn test_toggle_active_independent() {
        let sync = Arc::new(MemoryStore::new());
        let mut setup = surface(&sync, ScriptedAuthenticator::new(true));
        setup.toggle_active(true).await.unwrap();

        let snap = sync.snapshot().unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[KEY_ACTIVE], serde_json::json!(true));
        assert!(setup.is_active());
    }

    #[test]
    fn test_visibility_toggle() {
        let sync = Arc::new(MemoryStore::new());
        let mut setup = surface(&sync, ScriptedAuthenticator::new(true));
        assert_eq!(setup.form().field_kind(Field::New), InputKind::Password);
        assert_eq!(setup.form_mut().toggle_visibility(Field::New), InputKind::Text);
        assert_eq!(setup.form().field_kind(Field::Confirm), InputKind::Password);

        setup.select_method(UnlockMethod::Pin).unwrap();
        assert_eq!(setup.form().field_kind(Field::New), InputKind::Number);
        assert_eq!(setup.form_mut().toggle_visibility(Field::Confirm), InputKind::Text);
        assert_eq!(setup.form_mut().toggle_visibility(Field::Confirm), InputKind::Number);
    }

    #[tokio::test]
    async fn test_save_then_unlock_roundtrip() {
        let sync = Arc::new(MemoryStore::new());
        let mut setup = surface(&sync, ScriptedAuthenticator::new(true));
        setup.set_new_credential("  hunter2 ");
        setup.set_confirm_credential("hunter2");
        setup.save().await.unwrap();
        setup.toggle_active(true).await.unwrap();

        let lock = LockSurface::new(sync.clone(), NoAuthenticator);
        let mut overlay = lock.on_page_load().await.unwrap();
        assert_eq!(
            lock.submit_text(&mut overlay, "hunter3").await.unwrap(),
            Outcome::Rejected
        );
        assert_eq!(overlay.message(), "Incorrect password. Try again.");
        assert_eq!(
            lock.submit_text(&mut overlay, "hunter2").await.unwrap(),
            Outcome::Unlocked
        );
    }

    #[tokio::test]
    async fn test_pattern_roundtrip_order() {
        let sync = Arc::new(MemoryStore::new());
        let mut setup = surface(&sync, ScriptedAuthenticator::new(true));
        setup.select_method(UnlockMethod::Pattern).unwrap();
        for i in [0, 1, 2] {
            setup.select_cell(i).unwrap();
        }
        setup.save().await.unwrap();
        setup.toggle_active(true).await.unwrap();

        let lock = LockSurface::new(sync.clone(), NoAuthenticator);
        let mut overlay = lock.on_page_load().await.unwrap();
        for i in [2, 1, 0] {
            overlay.select_cell(i).unwrap();
        }
        assert_eq!(lock.submit_pattern(&mut overlay).await.unwrap(), Outcome::Rejected);
        for i in [0, 1, 2] {
            overlay.select_cell(i).unwrap();
        }
        assert_eq!(lock.submit_pattern(&mut overlay).await.unwrap(), Outcome::Unlocked);
    }
}
