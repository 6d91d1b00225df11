//! Locker Browser SDK - WebAssembly bindings for the extension pages.
//!
//! The popup (setup surface) and the content script (lock surface) share the
//! same digest and validation code through this module. JavaScript keeps
//! ownership of the platform calls (`chrome.storage`, `navigator.credentials`)
//! and feeds their results back in.
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { LockOverlay, lockChallenge, assertionTimeoutMs } from './locker_browser.js';
//!
//! await init();
//! chrome.storage.sync.get(["lockerActive", "unlockMethod", "credentialHash"], (data) => {
//!     const overlay = LockOverlay.fromStorage(JSON.stringify(data));
//!     if (!overlay) return; // incomplete configuration: page stays unlocked
//!
//!     // password / pin
//!     unlockButton.onclick = () => chrome.storage.sync.get(["credentialHash"], (r) => {
//!         if (overlay.submitText(input.value, r.credentialHash) === "unlocked") remove();
//!         else msg.innerText = overlay.message();
//!     });
//!
//!     // fingerprint
//!     authButton.onclick = async () => {
//!         try {
//!             const cred = await navigator.credentials.get({ publicKey: {
//!                 challenge: lockChallenge(), timeout: assertionTimeoutMs(),
//!                 userVerification: "required" } });
//!             if (cred && overlay.assertionSucceeded() === "unlocked") remove();
//!         } catch (e) {
//!             overlay.assertionFailed(String(e));
//!             msg.innerText = overlay.message();
//!         }
//!     };
//! });
//! ```

use js_sys::Array;
use wasm_bindgen::prelude::*;

use locker_core::authenticator::AuthenticatorConfig;
use locker_core::lock::{LockOverlay as CoreOverlay, OverlayControls, Outcome};
use locker_core::setup::{
    Field, SetupControls, SetupForm as CoreForm, FINGERPRINT_REGISTERED,
    FINGERPRINT_REGISTRATION_FAILED, SAVED,
};
use locker_core::storage::{KEY_DIGEST, KEY_METHOD};
use locker_core::{Assertion, AssertionError, LockerConfig, UnlockMethod};

/// SHA-256 hex digest of a canonical credential string.
#[wasm_bindgen]
pub fn digest(input: &str) -> String {
    locker_core::digest(input)
}

/// Challenge bytes for the lock surface's assertion call.
#[wasm_bindgen(js_name = lockChallenge)]
pub fn lock_challenge() -> Vec<u8> {
    AuthenticatorConfig::default().lock_challenge
}

/// Challenge bytes for fingerprint registration.
#[wasm_bindgen(js_name = registerChallenge)]
pub fn register_challenge() -> Vec<u8> {
    AuthenticatorConfig::default().register_challenge
}

/// Assertion timeout in milliseconds.
#[wasm_bindgen(js_name = assertionTimeoutMs)]
pub fn assertion_timeout_ms() -> u32 {
    AuthenticatorConfig::default().timeout_ms
}

fn outcome_str(outcome: Outcome) -> String {
    match outcome {
        Outcome::Unlocked => "unlocked",
        Outcome::Rejected => "rejected",
        Outcome::Unchanged => "unchanged",
    }
    .to_string()
}

fn parse_field(field: &str) -> Result<Field, JsError> {
    match field {
        "new" => Ok(Field::New),
        "confirm" => Ok(Field::Confirm),
        other => Err(JsError::new(&format!("Unknown field: {other}"))),
    }
}

/// Popup form state for registering a credential.
#[wasm_bindgen]
pub struct SetupForm {
    inner: CoreForm,
}

#[wasm_bindgen]
impl SetupForm {
    /// New form, password selected, every method offered.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: CoreForm::new(),
        }
    }

    /// Drop the fingerprint option when
    /// `isUserVerifyingPlatformAuthenticatorAvailable()` resolves `false`.
    #[wasm_bindgen(js_name = hideFingerprint)]
    pub fn hide_fingerprint(&mut self) {
        self.inner.hide_fingerprint();
    }

    /// Method names for the selector.
    #[wasm_bindgen(js_name = availableMethods)]
    pub fn available_methods(&self) -> Array {
        self.inner
            .available_methods()
            .iter()
            .map(|m| JsValue::from_str(m.as_str()))
            .collect()
    }

    #[wasm_bindgen(js_name = selectedMethod)]
    pub fn selected_method(&self) -> String {
        self.inner.selected_method().to_string()
    }

    /// Selector change. Returns `false` if the method was already selected.
    #[wasm_bindgen(js_name = selectMethod)]
    pub fn select_method(&mut self, method: &str) -> Result<bool, JsError> {
        let method: UnlockMethod = method
            .parse()
            .map_err(|e: locker_core::LockerError| JsError::new(&e.to_string()))?;
        self.inner
            .select_method(method)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Which setup block to show: `"text"`, `"pattern"` or `"fingerprint"`.
    pub fn controls(&self) -> String {
        match self.inner.controls() {
            SetupControls::TextFields { .. } => "text",
            SetupControls::PatternGrid => "pattern",
            SetupControls::FingerprintRegistration => "fingerprint",
        }
        .to_string()
    }

    /// Placeholders as `[new, confirm]`, or `None` outside text mode.
    #[wasm_bindgen(js_name = newPlaceholder)]
    pub fn new_placeholder(&self) -> Option<String> {
        match self.inner.controls() {
            SetupControls::TextFields { new_placeholder, .. } => Some(new_placeholder.to_string()),
            _ => None,
        }
    }

    #[wasm_bindgen(js_name = confirmPlaceholder)]
    pub fn confirm_placeholder(&self) -> Option<String> {
        match self.inner.controls() {
            SetupControls::TextFields {
                confirm_placeholder,
                ..
            } => Some(confirm_placeholder.to_string()),
            _ => None,
        }
    }

    #[wasm_bindgen(js_name = setNewCredential)]
    pub fn set_new_credential(&mut self, value: &str) {
        self.inner.set_new_credential(value);
    }

    #[wasm_bindgen(js_name = setConfirmCredential)]
    pub fn set_confirm_credential(&mut self, value: &str) {
        self.inner.set_confirm_credential(value);
    }

    /// Input `type` for `"new"` or `"confirm"`.
    #[wasm_bindgen(js_name = inputType)]
    pub fn input_type(&self, field: &str) -> Result<String, JsError> {
        Ok(self.inner.field_kind(parse_field(field)?).as_str().to_string())
    }

    /// Eye toggle. Returns the new input `type`.
    #[wasm_bindgen(js_name = toggleVisibility)]
    pub fn toggle_visibility(&mut self, field: &str) -> Result<String, JsError> {
        let field = parse_field(field)?;
        Ok(self.inner.toggle_visibility(field).as_str().to_string())
    }

    /// Pattern cell click. Returns `true` if the cell was newly selected.
    #[wasm_bindgen(js_name = selectCell)]
    pub fn select_cell(&mut self, index: usize) -> Result<bool, JsError> {
        self.inner
            .select_cell(index)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Selected pattern cells in click order.
    pub fn pattern(&self) -> Vec<u8> {
        self.inner.pattern().sequence().to_vec()
    }

    /// Validate and digest the current input.
    ///
    /// Returns the JSON object to pass to `chrome.storage.sync.set`. Throws
    /// the user-facing validation message otherwise (also left in `status()`).
    #[wasm_bindgen(js_name = prepareSave)]
    pub fn prepare_save(&mut self, fingerprint_registered: bool) -> Result<String, JsError> {
        let credential = self
            .inner
            .credential(fingerprint_registered)
            .map_err(|e| JsError::new(&e.to_string()))?;
        Ok(self.save_record(credential.method(), &credential.digest_hex()))
    }

    /// Call from the `chrome.storage.sync.set` completion callback.
    #[wasm_bindgen(js_name = markSaved)]
    pub fn mark_saved(&mut self) {
        self.inner.set_status(SAVED);
    }

    /// Record the outcome of the registration assertion call.
    #[wasm_bindgen(js_name = markRegistration)]
    pub fn mark_registration(&mut self, success: bool) {
        self.inner.set_status(if success {
            FINGERPRINT_REGISTERED
        } else {
            FINGERPRINT_REGISTRATION_FAILED
        });
    }

    pub fn status(&self) -> String {
        self.inner.status().to_string()
    }

    fn save_record(&self, method: UnlockMethod, digest_hex: &str) -> String {
        let mut record = serde_json::Map::new();
        record.insert(KEY_DIGEST.to_string(), digest_hex.into());
        record.insert(KEY_METHOD.to_string(), method.as_str().into());
        serde_json::Value::Object(record).to_string()
    }
}

impl Default for SetupForm {
    fn default() -> Self {
        Self::new()
    }
}

/// Content-script overlay state.
#[wasm_bindgen]
pub struct LockOverlay {
    inner: CoreOverlay,
}

#[wasm_bindgen]
impl LockOverlay {
    /// Engage from explicit values. Returns `undefined` when the page should
    /// stay unlocked.
    pub fn engage(
        active: bool,
        method: Option<String>,
        digest_hex: Option<String>,
    ) -> Option<LockOverlay> {
        let config = LockerConfig {
            active,
            method: method.filter(|m| !m.is_empty()),
            digest_hex: digest_hex.filter(|d| !d.is_empty()),
        };
        CoreOverlay::engage(&config).map(|inner| Self { inner })
    }

    /// Engage from the JSON text of a `chrome.storage.sync.get` result.
    #[wasm_bindgen(js_name = fromStorage)]
    pub fn from_storage(items_json: &str) -> Result<Option<LockOverlay>, JsError> {
        let items: serde_json::Map<String, serde_json::Value> = serde_json::from_str(items_json)
            .map_err(|e| JsError::new(&format!("Invalid JSON: {e}")))?;
        let config = LockerConfig::from_items(&items);
        Ok(CoreOverlay::engage(&config).map(|inner| Self { inner }))
    }

    pub fn heading(&self) -> String {
        self.inner.heading().to_string()
    }

    /// Method whose controls are shown (unknown names read as `"password"`).
    pub fn method(&self) -> String {
        self.inner.method().to_string()
    }

    /// `"text"`, `"pattern"` or `"fingerprint"`.
    pub fn controls(&self) -> String {
        match self.inner.controls() {
            OverlayControls::TextEntry { .. } => "text",
            OverlayControls::PatternGrid => "pattern",
            OverlayControls::Authenticate => "fingerprint",
        }
        .to_string()
    }

    /// Input `type` of the text field, if any.
    #[wasm_bindgen(js_name = inputType)]
    pub fn input_type(&self) -> Option<String> {
        match self.inner.controls() {
            OverlayControls::TextEntry { input, .. } => Some(input.as_str().to_string()),
            _ => None,
        }
    }

    pub fn placeholder(&self) -> Option<String> {
        match self.inner.controls() {
            OverlayControls::TextEntry { placeholder, .. } => Some(placeholder.to_string()),
            _ => None,
        }
    }

    #[wasm_bindgen(js_name = selectCell)]
    pub fn select_cell(&mut self, index: usize) -> Result<bool, JsError> {
        self.inner
            .select_cell(index)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Whether a grid cell should render as selected.
    #[wasm_bindgen(js_name = isSelected)]
    pub fn is_selected(&self, index: usize) -> bool {
        self.inner.pattern().is_selected(index)
    }

    /// Verify a password/PIN attempt against the freshly read stored digest.
    #[wasm_bindgen(js_name = submitText)]
    pub fn submit_text(&mut self, attempt: &str, stored_digest: Option<String>) -> String {
        outcome_str(self.inner.verify_text(attempt, stored_digest.as_deref()))
    }

    /// Verify the selected pattern against the freshly read stored digest.
    #[wasm_bindgen(js_name = submitPattern)]
    pub fn submit_pattern(&mut self, stored_digest: Option<String>) -> String {
        outcome_str(self.inner.verify_pattern(stored_digest.as_deref()))
    }

    /// The assertion call resolved with a non-null credential.
    #[wasm_bindgen(js_name = assertionSucceeded)]
    pub fn assertion_succeeded(&mut self) -> String {
        outcome_str(self.inner.apply_assertion(Ok(Some(Assertion::default()))))
    }

    /// The assertion call rejected or threw.
    #[wasm_bindgen(js_name = assertionFailed)]
    pub fn assertion_failed(&mut self, reason: &str) -> String {
        outcome_str(
            self.inner
                .apply_assertion(Err(AssertionError::Rejected(reason.to_string()))),
        )
    }

    #[wasm_bindgen(js_name = isLocked)]
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    pub fn message(&self) -> String {
        self.inner.message().to_string()
    }
}
