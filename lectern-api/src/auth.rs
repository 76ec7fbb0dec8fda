#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Bearer token pair handed out on login
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Answer to a token refresh; the refresh token is only present when the
/// server rotates it
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct AccessToken {
    pub access: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

impl TokenPair {
    pub fn refreshed(&self, tok: AccessToken) -> TokenPair {
        TokenPair {
            access: tok.access,
            refresh: tok.refresh.unwrap_or_else(|| self.refresh.clone()),
        }
    }
}
