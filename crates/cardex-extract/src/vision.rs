//! [`VisionExtractor`] — card field extraction through an OpenAI-compatible
//! chat-completions endpoint.
//!
//! The model is asked for a JSON object with the nine [`CardFields`] keys.
//! Whatever comes back is treated as untrusted: missing or non-string values
//! become empty strings and the result is sanitized before it is returned.

use std::time::Duration;

use cardex_core::CardFields;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{Error, Extractor, Result, validate_image_url};

// ─── Prompt ──────────────────────────────────────────────────────────────────

const SYSTEM_PROMPT: &str = r#"You are an OCR system specialised in reading business cards in any language (English, Arabic, and others).

Extract all visible text from the business card image and return JSON with exactly these fields:
{
  "companyName": "string",
  "fullName": "string",
  "firstName": "string",
  "lastName": "string",
  "jobTitle": "string",
  "department": "string",
  "mobileNumber": "string",
  "phoneNumber": "string",
  "email": "string"
}

Rules:
1. Read the whole image, including corners and edges.
2. Extract complete phone numbers, keeping every digit and the country code (e.g. +966512345678).
3. Extract complete email addresses, in lowercase.
4. fullName is the name exactly as printed; firstName is its first word and lastName the rest.
5. mobileNumber is the number marked mobile or cell, or the longer number; phoneNumber is the office/tel number.
6. companyName is the main, largest company text.
7. Extract jobTitle and department separately when both are visible.
8. Use an empty string "" for any field that is not visible."#;

const USER_PROMPT: &str = "Extract all information from this business card image. Phone numbers and email addresses must be complete, without truncation. The image may be rotated. Return only valid JSON.";

// ─── Configuration ───────────────────────────────────────────────────────────

/// Connection settings for the vision model.
#[derive(Debug, Clone, Deserialize)]
pub struct VisionConfig {
  /// Full chat-completions URL, e.g. `https://api.openai.com/v1/chat/completions`.
  pub endpoint:     String,
  #[serde(default)]
  pub api_key:      String,
  pub model:        String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 { 60 }

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ChatResponse {
  #[serde(default)]
  choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
  message: Message,
}

#[derive(Deserialize)]
struct Message {
  content: Option<Value>,
}

/// Build the chat-completions request body for `image_url`.
pub(crate) fn request_body(model: &str, image_url: &str) -> Value {
  json!({
    "model": model,
    "messages": [
      { "role": "system", "content": SYSTEM_PROMPT },
      {
        "role": "user",
        "content": [
          { "type": "text", "text": USER_PROMPT },
          {
            "type": "image_url",
            "image_url": { "url": image_url, "detail": "high" }
          }
        ]
      }
    ],
    "response_format": { "type": "json_object" }
  })
}

/// Pull the card fields out of a chat-completions response body.
pub(crate) fn parse_completion(body: &str) -> Result<CardFields> {
  let response: ChatResponse = serde_json::from_str(body)
    .map_err(|e| Error::ExtractionFailed(format!("malformed response: {e}")))?;

  let content = response
    .choices
    .into_iter()
    .next()
    .and_then(|c| c.message.content)
    .ok_or_else(|| Error::ExtractionFailed("response has no content".into()))?;

  let Value::String(text) = content else {
    return Err(Error::ExtractionFailed("content is not a string".into()));
  };

  let object: Value = serde_json::from_str(&text)
    .map_err(|e| Error::ExtractionFailed(format!("content is not JSON: {e}")))?;
  if !object.is_object() {
    return Err(Error::ExtractionFailed("content is not a JSON object".into()));
  }

  Ok(fields_from_object(&object).sanitized())
}

/// Read the nine fields leniently: anything missing or not a string is empty.
fn fields_from_object(object: &Value) -> CardFields {
  let field = |key: &str| {
    object
      .get(key)
      .and_then(Value::as_str)
      .unwrap_or_default()
      .to_owned()
  };

  CardFields {
    company_name:  field("companyName"),
    full_name:     field("fullName"),
    first_name:    field("firstName"),
    last_name:     field("lastName"),
    job_title:     field("jobTitle"),
    department:    field("department"),
    mobile_number: field("mobileNumber"),
    phone_number:  field("phoneNumber"),
    email:         field("email"),
  }
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// Vision-model extractor over HTTP.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct VisionExtractor {
  client: Client,
  config: VisionConfig,
}

impl VisionExtractor {
  pub fn new(config: VisionConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| Error::ExtractionFailed(format!("building HTTP client: {e}")))?;
    Ok(Self { client, config })
  }
}

impl Extractor for VisionExtractor {
  async fn extract(&self, image_url: &str) -> Result<CardFields> {
    let image_url = validate_image_url(image_url)?;

    let mut req = self
      .client
      .post(&self.config.endpoint)
      .json(&request_body(&self.config.model, &image_url));
    if !self.config.api_key.is_empty() {
      req = req.bearer_auth(&self.config.api_key);
    }

    let resp = req.send().await.map_err(|e| {
      tracing::warn!(error = %e, "vision request failed");
      Error::ExtractionFailed(e.to_string())
    })?;

    let status = resp.status();
    if !status.is_success() {
      tracing::warn!(%status, "vision endpoint returned an error status");
      return Err(Error::ExtractionFailed(format!("endpoint returned {status}")));
    }

    let body = resp
      .text()
      .await
      .map_err(|e| Error::ExtractionFailed(e.to_string()))?;
    let fields = parse_completion(&body).inspect_err(|e| {
      tracing::warn!(error = %e, "could not parse vision response");
    })?;

    tracing::debug!(%image_url, "extracted card fields");
    Ok(fields)
  }
}
