// SPDX-License-Identifier: MIT

//! HTTP client for the daemon surface.

use crate::exit_error::ExitError;
use el_wire::ErrorBody;
use reqwest::{Method, StatusCode};
use serde_json::Value;

pub struct Client {
    base: String,
    http: reqwest::Client,
}

impl Client {
    /// Base URL from `ELEMENTAL_URL`, defaulting to the local daemon.
    pub fn from_env() -> Self {
        let base = std::env::var("ELEMENTAL_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:7420".to_string());
        Self { base: base.trim_end_matches('/').to_string(), http: reqwest::Client::new() }
    }

    pub async fn get(&self, path: &str) -> Result<Value, ExitError> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Value, ExitError> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> Result<Value, ExitError> {
        self.request(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ExitError> {
        self.request(Method::DELETE, path, None).await
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ExitError> {
        let url = format!("{}{}", self.base, path);
        let mut req = self.http.request(method, &url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| {
            ExitError::general(format!("daemon unreachable at {}: {e}", self.base))
        })?;

        let status = response.status();
        let payload: Value = response.json().await.unwrap_or(Value::Null);
        if status.is_success() {
            return Ok(payload);
        }

        // Prefer the daemon's typed error body; fall back to the status.
        match serde_json::from_value::<ErrorBody>(payload.clone()) {
            Ok(body) => Err(ExitError::from_api(body.error.code, body.error.message)),
            Err(_) => Err(ExitError::general(status_message(status, &url))),
        }
    }
}

fn status_message(status: StatusCode, url: &str) -> String {
    format!("request to {url} failed: {status}")
}
