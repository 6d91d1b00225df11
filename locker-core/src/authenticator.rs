//! Platform assertion boundary (WebAuthn `navigator.credentials.get`).
//!
//! The locker never inspects the returned credential: a non-null result is
//! success, a rejection is failure, and a null result changes nothing.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AssertionError;

/// Challenge used by the lock surface.
pub const LOCK_CHALLENGE: &[u8] = b"randomChallengeString";

/// Challenge used by fingerprint registration in the setup surface.
pub const REGISTER_CHALLENGE: &[u8] = b"registerChallenge";

/// Default assertion timeout (60 seconds).
pub const DEFAULT_TIMEOUT_MS: u32 = 60_000;

/// WebAuthn `userVerification` requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserVerification {
    #[default]
    Required,
    Preferred,
    Discouraged,
}

impl UserVerification {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Preferred => "preferred",
            Self::Discouraged => "discouraged",
        }
    }
}

/// Parameters of one assertion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionRequest {
    pub challenge: Vec<u8>,
    pub timeout_ms: u32,
    pub user_verification: UserVerification,
}

/// Opaque success token. Its content is never read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assertion {
    pub credential_id: Vec<u8>,
}

/// Assertion parameters for both surfaces.
#[derive(Clone, Debug)]
pub struct AuthenticatorConfig {
    /// Challenge bytes sent when unlocking
    pub lock_challenge: Vec<u8>,
    /// Challenge bytes sent when registering
    pub register_challenge: Vec<u8>,
    /// Assertion timeout in milliseconds (default: 60000)
    pub timeout_ms: u32,
}

impl Default for AuthenticatorConfig {
    fn default() -> Self {
        Self {
            lock_challenge: LOCK_CHALLENGE.to_vec(),
            register_challenge: REGISTER_CHALLENGE.to_vec(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl AuthenticatorConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    #[must_use]
    pub fn with_lock_challenge(mut self, challenge: impl Into<Vec<u8>>) -> Self {
        self.lock_challenge = challenge.into();
        self
    }

    #[must_use]
    pub fn with_register_challenge(mut self, challenge: impl Into<Vec<u8>>) -> Self {
        self.register_challenge = challenge.into();
        self
    }

    #[must_use]
    pub fn lock_request(&self) -> AssertionRequest {
        self.request(&self.lock_challenge)
    }

    #[must_use]
    pub fn register_request(&self) -> AssertionRequest {
        self.request(&self.register_challenge)
    }

    fn request(&self, challenge: &[u8]) -> AssertionRequest {
        AssertionRequest {
            challenge: challenge.to_vec(),
            timeout_ms: self.timeout_ms,
            user_verification: UserVerification::Required,
        }
    }
}

/// A user-verifying platform authenticator.
#[async_trait]
pub trait PlatformAuthenticator: Send + Sync {
    /// Whether a user-verifying platform authenticator is present.
    async fn is_available(&self) -> bool;

    /// Ask the user to prove possession.
    ///
    /// `Ok(None)` is a null result: neither success nor failure.
    async fn get_assertion(
        &self,
        request: &AssertionRequest,
    ) -> Result<Option<Assertion>, AssertionError>;
}

#[async_trait]
impl<T: PlatformAuthenticator + ?Sized> PlatformAuthenticator for std::sync::Arc<T> {
    async fn is_available(&self) -> bool {
        (**self).is_available().await
    }

    async fn get_assertion(
        &self,
        request: &AssertionRequest,
    ) -> Result<Option<Assertion>, AssertionError> {
        (**self).get_assertion(request).await
    }
}

/// Authenticator for hosts without one; every call is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuthenticator;

#[async_trait]
impl PlatformAuthenticator for NoAuthenticator {
    async fn is_available(&self) -> bool {
        false
    }

    async fn get_assertion(
        &self,
        _request: &AssertionRequest,
    ) -> Result<Option<Assertion>, AssertionError> {
        Err(AssertionError::Unavailable)
    }
}

/// Authenticator that replays programmed outcomes in order and records requests.
///
/// Once the script runs out every call is rejected.
#[derive(Debug, Default)]
pub struct ScriptedAuthenticator {
    available: bool,
    outcomes: Mutex<VecDeque<Result<Option<Assertion>, AssertionError>>>,
    requests: Mutex<Vec<AssertionRequest>>,
}

impl ScriptedAuthenticator {
    #[must_use]
    pub fn new(available: bool) -> Self {
        Self {
            available,
            ..Self::default()
        }
    }

    /// Queue an outcome for the next call.
    #[must_use]
    pub fn then(self, outcome: Result<Option<Assertion>, AssertionError>) -> Self {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.push_back(outcome);
        }
        self
    }

    #[must_use]
    pub fn then_succeed(self) -> Self {
        self.then(Ok(Some(Assertion::default())))
    }

    #[must_use]
    pub fn then_reject(self, reason: &str) -> Self {
        self.then(Err(AssertionError::Rejected(reason.to_string())))
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<AssertionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PlatformAuthenticator for ScriptedAuthenticator {
    async fn is_available(&self) -> bool {
        self.available
    }

    async fn get_assertion(
        &self,
        request: &AssertionRequest,
    ) -> Result<Option<Assertion>, AssertionError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        self.outcomes
            .lock()
            .ok()
            .and_then(|mut outcomes| outcomes.pop_front())
            .unwrap_or_else(|| Err(AssertionError::Rejected("no scripted outcome".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_requests() {
        let config = AuthenticatorConfig::new();
        let lock = config.lock_request();
        assert_eq!(lock.challenge, b"randomChallengeString");
        assert_eq!(lock.timeout_ms, 60_000);
        assert_eq!(lock.user_verification.as_str(), "required");
        assert_eq!(config.register_request().challenge, b"registerChallenge");
    }

    #[test]
    fn test_builder() {
        let config = AuthenticatorConfig::new()
            .with_timeout(5_000)
            .with_lock_challenge(b"abc".to_vec());
        assert_eq!(config.lock_request().timeout_ms, 5_000);
        assert_eq!(config.lock_request().challenge, b"abc");
    }

    #[tokio::test]
    async fn test_scripted_order() {
        let auth = ScriptedAuthenticator::new(true)
            .then_reject("NotAllowedError")
            .then(Ok(None))
            .then_succeed();
        let req = AuthenticatorConfig::new().lock_request();

        assert!(auth.get_assertion(&req).await.is_err());
        assert_eq!(auth.get_assertion(&req).await, Ok(None));
        assert!(matches!(auth.get_assertion(&req).await, Ok(Some(_))));
        assert!(auth.get_assertion(&req).await.is_err());
        assert_eq!(auth.requests().len(), 4);
    }

    #[tokio::test]
    async fn test_no_authenticator() {
        let req = AuthenticatorConfig::new().lock_request();
        assert!(!NoAuthenticator.is_available().await);
        assert_eq!(
            NoAuthenticator.get_assertion(&req).await,
            Err(AssertionError::Unavailable)
        );
    }
}
