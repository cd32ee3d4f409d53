// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google sign-in: authorization code exchange, ID token refresh, and the
//! signed OAuth `state` parameter.

use crate::config::Config;
use crate::error::AppError;
use crate::services::google_oidc::{GoogleIdTokenVerifier, VerifiedIdentity};
use anyhow::Context;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

/// Signed OAuth state is accepted for this long after it was issued.
const OAUTH_STATE_MAX_AGE_MS: u128 = 10 * 60 * 1000;

/// Tokens obtained from a successful sign-in or refresh.
#[derive(Debug, Clone)]
pub struct SignInTokens {
    pub id_token: String,
    /// Absent on refresh responses; the existing refresh token stays valid.
    pub refresh_token: Option<String>,
    pub identity: VerifiedIdentity,
}

#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    id_token: Option<String>,
    refresh_token: Option<String>,
}

/// Client for Google's OAuth endpoints.
pub struct GoogleIdentity {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    auth_url: String,
    token_url: String,
    redirect_uri: String,
    state_key: Vec<u8>,
    verifier: Arc<GoogleIdTokenVerifier>,
}

impl GoogleIdentity {
    pub fn new(config: &Config, verifier: Arc<GoogleIdTokenVerifier>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("failed building Google OAuth HTTP client")?;

        Ok(Self {
            http,
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            auth_url: config.google_auth_url.clone(),
            token_url: config.google_token_url.clone(),
            redirect_uri: config.oauth_callback_url(),
            state_key: config.oauth_state_key.clone(),
            verifier,
        })
    }

    /// URL of Google's consent screen for a new sign-in.
    ///
    /// `prompt=consent` makes Google issue a refresh token on every sign-in,
    /// not only the first one for this client.
    pub fn authorization_url(&self, return_to: &str) -> anyhow::Result<String> {
        let state = sign_oauth_state(return_to, &self.state_key)?;

        Ok(format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&\
             scope={}&access_type=offline&prompt=select_account%20consent&state={}",
            self.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode("openid email profile"),
            state
        ))
    }

    /// Verify the callback's `state` and return the page to land on.
    pub fn verify_state(&self, state: &str) -> Option<String> {
        verify_oauth_state(state, &self.state_key, now_millis())
    }

    /// Exchange an authorization code for verified tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<SignInTokens, AppError> {
        let response = self
            .token_request(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .await?;

        self.verified_tokens(response).await
    }

    /// Obtain a fresh ID token using a refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<SignInTokens, AppError> {
        let response = self
            .token_request(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .await?;

        self.verified_tokens(response).await
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenEndpointResponse, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::Identity(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if body.contains("invalid_grant") {
                return Err(AppError::InvalidToken);
            }
            return Err(AppError::Identity(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Identity(format!("JSON parse error: {}", e)))
    }

    async fn verified_tokens(
        &self,
        response: TokenEndpointResponse,
    ) -> Result<SignInTokens, AppError> {
        let id_token = response
            .id_token
            .ok_or_else(|| AppError::Identity("token response has no id_token".to_string()))?;

        let identity = self
            .verifier
            .verify(&id_token)
            .await
            .map_err(|e| AppError::Identity(e.to_string()))?;

        Ok(SignInTokens {
            id_token,
            refresh_token: response.refresh_token,
            identity,
        })
    }
}

/// Whether a credential expiring at `expires_at` must be refreshed now.
pub fn needs_refresh(expires_at: DateTime<Utc>, now: DateTime<Utc>, margin: Duration) -> bool {
    now + margin >= expires_at
}

/// Build the signed OAuth state: base64url("return_to|timestamp_hex|sig_hex").
pub fn sign_oauth_state(return_to: &str, secret: &[u8]) -> anyhow::Result<String> {
    sign_oauth_state_at(return_to, secret, now_millis())
}

fn sign_oauth_state_at(return_to: &str, secret: &[u8], timestamp_ms: u128) -> anyhow::Result<String> {
    let payload = format!("{}|{:x}", return_to, timestamp_ms);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| anyhow::anyhow!("HMAC init failed: {}", e))?;
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Verify signature and age of the OAuth state; returns the landing path.
///
/// Only local paths are returned so the state cannot redirect off-site.
pub fn verify_oauth_state(state: &str, secret: &[u8], now_ms: u128) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // return_to may not contain '|', so split from the right
    let mut parts = state_str.rsplitn(3, '|');
    let signature_hex = parts.next()?;
    let timestamp_hex = parts.next()?;
    let return_to = parts.next()?;

    let signature = hex::decode(signature_hex).ok()?;
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(format!("{}|{}", return_to, timestamp_hex).as_bytes());
    if mac.verify_slice(&signature).is_err() {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    let issued_ms = u128::from_str_radix(timestamp_hex, 16).ok()?;
    if now_ms.saturating_sub(issued_ms) > OAUTH_STATE_MAX_AGE_MS {
        tracing::warn!("OAuth state expired");
        return None;
    }

    if !return_to.starts_with('/') || return_to.starts_with("//") {
        return Some("/".to_string());
    }

    Some(return_to.to_string())
}

fn now_millis() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}
