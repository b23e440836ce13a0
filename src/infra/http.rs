use base64::prelude::{BASE64_STANDARD, Engine as _};
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, AUTHORIZATION},
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::error::{FetchError, FetchResult};

const MAX_ERROR_BODY: usize = 300;

/// Username and token sent as HTTP basic auth. Azure accepts an empty
/// username next to a personal access token.
pub struct BasicAuth {
    user: String,
    token: SecretString,
}

impl BasicAuth {
    pub fn new(user: impl Into<String>, token: SecretString) -> Self {
        Self {
            user: user.into(),
            token,
        }
    }

    fn header(&self) -> String {
        let credentials = format!("{}:{}", self.user, self.token.expose_secret());
        let encoded = BASE64_STANDARD.encode(credentials);
        format!("Basic {encoded}")
    }
}

/// Authenticated GET expecting a JSON body.
///
/// `203 Non-Authoritative` counts as a failure: Azure answers rejected
/// tokens with a sign-in page under that status.
pub async fn get_json(http: &Client, url: &str, auth: &BasicAuth) -> FetchResult<Value> {
    tracing::trace!(url, "GET");
    let response = http
        .get(url)
        .header(AUTHORIZATION, auth.header())
        .header(ACCEPT, "application/json")
        .send()
        .await
        .map_err(|err| FetchError::Transport(err.to_string()))?;

    let status = response.status();
    if !status.is_success() || status == StatusCode::NON_AUTHORITATIVE_INFORMATION {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unable to read response>".to_string());
        return Err(FetchError::Status {
            status,
            body: truncate(body.trim(), MAX_ERROR_BODY),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|err| FetchError::Transport(err.to_string()))?;
    serde_json::from_str(&body).map_err(|err| FetchError::Decode(err.to_string()))
}

pub fn trim_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}
