// RemoteVerifier - reqwest adapter for the classification endpoint
//
// Sends the snapshot plus the fixed instruction as a multipart POST and
// expects the response text to contain a JSON object
// `{"isSuspicious": bool, "reason": string}`. The service may wrap the
// object in surrounding prose, so the object is extracted by locating the
// first `{` and the last `}` before parsing. Every failure mode maps to a
// VerifyError, which callers degrade to "not suspicious".

use std::time::Duration;

use futures::future::BoxFuture;
use log::debug;

use crate::config::VerifierConfig;
use crate::error::VerifyError;

use super::{Verifier, VerifierVerdict};

/// Classification client backed by a remote HTTP endpoint
pub struct RemoteVerifier {
    config: VerifierConfig,
    client: reqwest::Client,
}

impl RemoteVerifier {
    pub fn new(config: VerifierConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { config, client }
    }

    async fn request(
        client: reqwest::Client,
        config: VerifierConfig,
        snapshot: Vec<u8>,
    ) -> Result<VerifierVerdict, VerifyError> {
        let image = reqwest::multipart::Part::bytes(snapshot)
            .file_name("frame.jpg")
            .mime_str("image/jpeg")
            .map_err(|err| VerifyError::RequestFailed {
                reason: err.to_string(),
            })?;
        let form = reqwest::multipart::Form::new()
            .part("image", image)
            .text("instruction", config.instruction.clone());

        let response = client
            .post(&config.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerifyError::RequestFailed {
                reason: format!("HTTP {}", status),
            });
        }

        let body = response.text().await?;
        debug!("[Verifier] Raw response: {} bytes", body.len());
        extract_verdict(&body)
    }
}

impl Verifier for RemoteVerifier {
    fn verify(&self, snapshot: Vec<u8>) -> BoxFuture<'static, Result<VerifierVerdict, VerifyError>> {
        let client = self.client.clone();
        let config = self.config.clone();
        Box::pin(Self::request(client, config, snapshot))
    }
}

/// Extract and parse the verdict object from raw response text.
///
/// The remote service may wrap the JSON in surrounding text; the object is
/// taken as everything between the first `{` and the last `}`.
pub(crate) fn extract_verdict(body: &str) -> Result<VerifierVerdict, VerifyError> {
    let start = body.find('{').ok_or_else(|| VerifyError::MalformedResponse {
        reason: "no opening brace in response".to_string(),
    })?;
    let end = body.rfind('}').ok_or_else(|| VerifyError::MalformedResponse {
        reason: "no closing brace in response".to_string(),
    })?;
    if end < start {
        return Err(VerifyError::MalformedResponse {
            reason: "braces out of order in response".to_string(),
        });
    }

    serde_json::from_str(&body[start..=end]).map_err(|err| VerifyError::MalformedResponse {
        reason: err.to_string(),
    })
}
