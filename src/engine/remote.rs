//! Remote engine: both engine traits backed by the toolkit's HTTP API.
//!
//! | Call | Request | Response |
//! |------|---------|----------|
//! | recognize | `POST {base}/ocr/detect`, multipart `file` | `{detectedScript, candidates, stages}` |
//! | extract   | `POST {base}/ocr/extract`, multipart `file` + `language` | `{text}` or `{error}` |
//!
//! The server computes the stage scores; this adapter only moves bytes and
//! JSON. Non-2xx answers become [`EngineError::Failed`] carrying the status
//! and body so the caller sees the server's own message.

use super::{InputFile, Recognition, RecognitionEngine, TextExtractor};
use crate::error::EngineError;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

const ENGINE_NAME: &str = "remote";

/// HTTP client for the toolkit's OCR endpoints.
pub struct RemoteEngine {
    client: reqwest::Client,
    base_url: String,
    api_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl RemoteEngine {
    /// Create a client for the API rooted at `base_url`.
    pub fn new(base_url: impl Into<String>, api_timeout_secs: u64) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api_timeout_secs))
            .build()
            .map_err(|e| EngineError::Failed(format!("failed to build HTTP client: {e}")))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!("Remote OCR engine at {}", base_url);
        Ok(Self {
            client,
            base_url,
            api_timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn file_part(&self, file: &InputFile) -> Result<Part, EngineError> {
        Part::bytes(file.bytes().to_vec())
            .file_name(file.name().to_string())
            .mime_str(file.kind().mime_type())
            .map_err(|e| EngineError::Failed(e.to_string()))
    }

    async fn post(&self, path: &str, form: Form) -> Result<String, EngineError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(EngineError::Failed(format!("HTTP {status}: {}", body.trim())));
        }
        Ok(body)
    }

    fn transport_error(&self, e: reqwest::Error) -> EngineError {
        if e.is_timeout() {
            EngineError::Timeout {
                secs: self.api_timeout_secs,
            }
        } else {
            EngineError::Failed(e.to_string())
        }
    }
}

#[async_trait]
impl RecognitionEngine for RemoteEngine {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    async fn recognize(&self, file: &InputFile) -> Result<Recognition, EngineError> {
        let form = Form::new().part("file", self.file_part(file)?);
        let body = self.post("/ocr/detect", form).await?;
        serde_json::from_str(&body).map_err(|e| EngineError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl TextExtractor for RemoteEngine {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    async fn extract_text(&self, file: &InputFile, language: &str) -> Result<String, EngineError> {
        let form = Form::new()
            .part("file", self.file_part(file)?)
            .text("language", language.to_string());
        let body = self.post("/ocr/extract", form).await?;
        parse_extract(&body)
    }
}

fn parse_extract(body: &str) -> Result<String, EngineError> {
    let parsed: ExtractResponse =
        serde_json::from_str(body).map_err(|e| EngineError::MalformedResponse(e.to_string()))?;
    match (parsed.text, parsed.error) {
        (_, Some(error)) => Err(EngineError::Failed(error)),
        (Some(text), None) => Ok(text),
        (None, None) => Err(EngineError::MalformedResponse(
            "response has neither 'text' nor 'error'".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let engine = RemoteEngine::new("http://localhost:8080/api/", 10).unwrap();
        assert_eq!(engine.base_url(), "http://localhost:8080/api");
    }

    #[test]
    fn parse_extract_text() {
        assert_eq!(parse_extract(r#"{"text": "Hola"}"#).unwrap(), "Hola");
    }

    #[test]
    fn parse_extract_error_is_verbatim() {
        let err = parse_extract(r#"{"error": "tesseract: language 'xx' not installed"}"#).unwrap_err();
        assert_eq!(err.to_string(), "tesseract: language 'xx' not installed");
    }

    #[test]
    fn parse_extract_empty_object_is_malformed() {
        assert!(matches!(
            parse_extract("{}"),
            Err(EngineError::MalformedResponse(_))
        ));
    }

    #[test]
    fn detect_payload_parses_into_recognition() {
        let body = r#"{
            "detectedScript": "Latin",
            "candidates": [
                {"code": "en", "confidenceScore": 62.5, "isLikely": true, "isHighConfidence": false},
                {"code": "nl", "confidenceScore": 20}
            ],
            "stages": [{"name": "script", "outcome": {"label": "Latin"}}]
        }"#;
        let r: Recognition = serde_json::from_str(body).unwrap();
        assert_eq!(r.detected_script, "Latin");
        assert_eq!(r.candidates.len(), 2);
        assert!(r.candidates[0].is_likely);
        assert_eq!(r.stages[0].name, "script");
    }
}
