//! Login state, access-token expiry and the signed session cookie.
//!
//! The session is written only by [`SessionManager`]. Everything else reads it
//! through a cloned [`SessionContext`] handle.

use std::str::FromStr;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use affiliation_api::types::{LoginRequest, LoginTokens};
use affiliation_api::Client;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::cache::MemoryCache;
use crate::error::{status_message, DashboardError, ValidationErrors};
use crate::navigation::{RedirectGuard, LOGIN_ROUTE, ROOT_ROUTE};
use crate::validation::validate_login;

/// Lifetime of a persisted session.
pub const SESSION_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

pub const SESSION_COOKIE_NAME: &str = "affiliation.session-token";

/// Shown when the login request never produced an answer.
pub const LOGIN_FALLBACK_MESSAGE: &str = "Check your Credentials";

/// An authenticated user's tokens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub email: Option<String>,
}

impl Session {
    /// Builds a session from a login response. The submitted email fills in
    /// when the backend does not echo one.
    pub fn from_tokens(tokens: LoginTokens, submitted_email: &str) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user_id: tokens.user_id,
            email: tokens.email.or_else(|| Some(submitted_email.to_string())),
        }
    }

    /// Expiry of the access token in epoch milliseconds, read from its `exp`
    /// claim. `None` when the token carries no readable `exp`.
    pub fn expires_at_epoch_ms(&self) -> Option<i64> {
        access_token_expiry_ms(&self.access_token)
    }

    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.expires_at_epoch_ms().is_some_and(|exp| now_ms >= exp)
    }
}

#[derive(Deserialize)]
struct ExpiryClaim {
    exp: Option<i64>,
}

/// Reads `exp` from a JWT without checking its signature. The backend signs
/// access tokens with a key we never see.
pub fn access_token_expiry_ms(token: &str) -> Option<i64> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    match decode::<ExpiryClaim>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(data) => data.claims.exp.map(|exp| exp.saturating_mul(1000)),
        Err(e) => {
            tracing::debug!("access token has no readable expiry: {}", e);
            None
        }
    }
}

/// What happens when a stored access token is past its `exp`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpiryPolicy {
    /// Treat the session as gone; the next request goes out without a token.
    #[default]
    RequireLogin,
    /// Keep handing out the expired token and let the backend decide.
    Passthrough,
}

impl FromStr for ExpiryPolicy {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "require-login" | "require_login" => Ok(ExpiryPolicy::RequireLogin),
            "passthrough" => Ok(ExpiryPolicy::Passthrough),
            _ => Err(DashboardError::Unknown(format!(
                "unknown expiry policy '{}'. Valid values: require-login, passthrough",
                s
            ))),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticating,
    Authenticated(Session),
}

/// Shared, read-mostly handle to the current session.
#[derive(Clone, Debug, Default)]
pub struct SessionContext {
    state: Arc<RwLock<SessionState>>,
    policy: ExpiryPolicy,
}

impl SessionContext {
    pub fn new(policy: ExpiryPolicy) -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState::Unauthenticated)),
            policy,
        }
    }

    pub fn policy(&self) -> ExpiryPolicy {
        self.policy
    }

    pub fn state(&self) -> SessionState {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// The live session, with the expiry policy applied.
    pub fn session(&self) -> Option<Session> {
        let session = match self.state() {
            SessionState::Authenticated(session) => session,
            _ => return None,
        };
        if self.policy == ExpiryPolicy::RequireLogin
            && session.is_expired_at(Utc::now().timestamp_millis())
        {
            tracing::info!("access token for user {} has expired", session.user_id);
            return None;
        }
        Some(session)
    }

    pub fn access_token(&self) -> Option<String> {
        self.session().map(|s| s.access_token)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }

    fn set(&self, state: SessionState) {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = state;
    }
}

/// Result of a login attempt. Failures are values, never errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Logged in; go to `redirect_to`.
    Authenticated { session: Session, redirect_to: String },
    /// The form was rejected before any request was made.
    Invalid(ValidationErrors),
    /// The backend refused, or could not be reached. Shown verbatim.
    Rejected { message: String },
}

/// Owns the login and sign-out transitions.
pub struct SessionManager {
    api: Client,
    context: SessionContext,
    cache: Option<Arc<MemoryCache>>,
    guard: Option<Arc<RedirectGuard>>,
}

impl SessionManager {
    pub fn new(api: Client, context: SessionContext) -> Self {
        Self {
            api,
            context,
            cache: None,
            guard: None,
        }
    }

    /// Report cache to drop on sign-out.
    pub fn with_cache(mut self, cache: Arc<MemoryCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Redirect guard to re-arm after a successful login.
    pub fn with_redirect_guard(mut self, guard: Arc<RedirectGuard>) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub async fn login(&self, email: &str, password: &str) -> LoginOutcome {
        if let Err(errors) = validate_login(email, password) {
            return LoginOutcome::Invalid(errors);
        }

        self.context.set(SessionState::Authenticating);
        tracing::debug!("logging in as {}", email);

        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        match self.api.login(&request).await {
            Ok(tokens) => {
                let session = Session::from_tokens(tokens, &request.email);
                tracing::info!("logged in as user {}", session.user_id);
                self.context
                    .set(SessionState::Authenticated(session.clone()));
                if let Some(guard) = &self.guard {
                    guard.reset();
                }
                LoginOutcome::Authenticated {
                    session,
                    redirect_to: ROOT_ROUTE.to_string(),
                }
            }
            Err(e) => {
                self.context.set(SessionState::Unauthenticated);
                let message = login_failure_message(&e);
                tracing::warn!("login failed: {}", message);
                LoginOutcome::Rejected { message }
            }
        }
    }

    /// Adopts a session read back from storage.
    pub fn restore(&self, session: Session) {
        tracing::debug!("restored session for user {}", session.user_id);
        self.context.set(SessionState::Authenticated(session));
    }

    /// Destroys the session and cached reports. Returns the login route.
    pub fn sign_out(&self) -> &'static str {
        self.context.set(SessionState::Unauthenticated);
        if let Some(cache) = &self.cache {
            cache.clear();
        }
        tracing::info!("signed out");
        LOGIN_ROUTE
    }
}

fn login_failure_message(e: &affiliation_api::Error) -> String {
    use affiliation_api::Error as ApiError;
    match e {
        ApiError::HttpStatus {
            message: Some(message),
            ..
        } if !message.is_empty() => message.clone(),
        ApiError::HttpStatus { status, reason, .. } => status_message(*status, reason.as_deref()),
        ApiError::RequestFailed | ApiError::Timeout | ApiError::ParseFailed(_) => {
            LOGIN_FALLBACK_MESSAGE.to_string()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    email: Option<String>,
    iat: i64,
    exp: i64,
}

/// Stateless session persistence: the whole session travels in an HS256
/// token signed with a local secret.
#[derive(Clone)]
pub struct SessionCookie {
    secret: Vec<u8>,
    max_age: Duration,
}

impl std::fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCookie")
            .field("secret", &"<redacted>")
            .field("max_age", &self.max_age)
            .finish()
    }
}

impl SessionCookie {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            max_age: SESSION_MAX_AGE,
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// A fresh 256-bit secret, base64 encoded.
    pub fn generate_secret() -> String {
        use base64::{engine::general_purpose, Engine as _};
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let bytes: Vec<u8> = (0..32).map(|_| rng.gen::<u8>()).collect();
        general_purpose::STANDARD.encode(bytes)
    }

    /// Signs `session` into a token that expires after the max age.
    pub fn seal(&self, session: &Session) -> Result<String, DashboardError> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: session.user_id.clone(),
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
            email: session.email.clone(),
            iat: now,
            exp: now + self.max_age.as_secs() as i64,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|e| DashboardError::Session(format!("failed to seal session: {}", e)))
    }

    /// Verifies and decodes a sealed session. Expired or tampered tokens fail.
    pub fn open(&self, token: &str) -> Result<Session, DashboardError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<SessionClaims>(
            token.trim(),
            &DecodingKey::from_secret(&self.secret),
            &validation,
        )
        .map_err(|e| DashboardError::Session(format!("invalid session: {}", e)))?;
        let claims = data.claims;
        Ok(Session {
            access_token: claims.access_token,
            refresh_token: claims.refresh_token,
            user_id: claims.sub,
            email: claims.email,
        })
    }

    /// `Set-Cookie` value carrying a sealed session.
    pub fn set_cookie_header(&self, token: &str) -> String {
        format!(
            "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
            SESSION_COOKIE_NAME,
            token,
            self.max_age.as_secs()
        )
    }

    /// `Set-Cookie` value that deletes the session cookie.
    pub fn clear_cookie_header(&self) -> String {
        format!(
            "{}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0",
            SESSION_COOKIE_NAME
        )
    }
}
