use serde::{Deserialize, Serialize};

/// Body of `POST /auth/login/`.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Tokens and identity extracted from a successful login.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub email: Option<String>,
}

impl LoginTokens {
    /// Reads a login response body.
    ///
    /// The payload may sit under `data` or at the top level, and the backend
    /// has shipped both snake_case and camelCase field names. For the user id,
    /// `user_id`, `userId` and `id` are tried in that order; numeric ids are
    /// stringified. Returns `None` when no access token is present.
    pub fn from_response(body: &serde_json::Value) -> Option<Self> {
        let payload = match body.get("data") {
            Some(data) if data.is_object() => data,
            _ => body,
        };

        let access_token = pick_string(payload, &["access_token", "accessToken"])?;
        let refresh_token =
            pick_string(payload, &["refresh_token", "refreshToken"]).unwrap_or_default();
        let user_id = pick_string(payload, &["user_id", "userId", "id"]).unwrap_or_default();
        let email = pick_string(payload, &["email"]);

        Some(LoginTokens {
            access_token,
            refresh_token,
            user_id,
            email,
        })
    }
}

fn pick_string(payload: &serde_json::Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match payload.get(*key)? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snake_case_top_level() {
        let tokens = LoginTokens::from_response(&json!({
            "access_token": "T",
            "refresh_token": "R",
            "user_id": "U",
        }))
        .unwrap();
        assert_eq!(tokens.access_token, "T");
        assert_eq!(tokens.refresh_token, "R");
        assert_eq!(tokens.user_id, "U");
        assert_eq!(tokens.email, None);
    }

    #[test]
    fn camel_case_wrapped_in_data() {
        let tokens = LoginTokens::from_response(&json!({
            "success": true,
            "data": {
                "accessToken": "A",
                "refreshToken": "B",
                "userId": "C",
                "email": "a@b.com",
            }
        }))
        .unwrap();
        assert_eq!(tokens.access_token, "A");
        assert_eq!(tokens.refresh_token, "B");
        assert_eq!(tokens.user_id, "C");
        assert_eq!(tokens.email.as_deref(), Some("a@b.com"));
    }

    #[test]
    fn numeric_id_fallback() {
        let tokens = LoginTokens::from_response(&json!({
            "access_token": "T",
            "id": 42,
        }))
        .unwrap();
        assert_eq!(tokens.user_id, "42");
        assert_eq!(tokens.refresh_token, "");
    }

    #[test]
    fn snake_case_wins_over_camel_case() {
        let tokens = LoginTokens::from_response(&json!({
            "access_token": "snake",
            "accessToken": "camel",
        }))
        .unwrap();
        assert_eq!(tokens.access_token, "snake");
    }

    #[test]
    fn missing_access_token() {
        assert!(LoginTokens::from_response(&json!({"refresh_token": "R"})).is_none());
        assert!(LoginTokens::from_response(&json!({"data": null, "access_token": ""})).is_none());
    }

    #[test]
    fn password_not_in_debug_output() {
        let req = LoginRequest {
            email: "a@b.com".into(),
            password: "secret1".into(),
        };
        let dbg = format!("{:?}", req);
        assert!(!dbg.contains("secret1"));
    }
}
