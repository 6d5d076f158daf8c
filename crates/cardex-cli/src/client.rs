//! Async HTTP client wrapping the cardex JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use cardex_core::{
  Card, CardFields, CardId, NewCard, Tag,
  query::{SortKey, SortOrder},
  stats::Statistics,
};
use cardex_export::Format;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;

/// Response header set by the server when a read was served from an empty,
/// degraded listing.
const DEGRADED_HEADER: &str = "x-cardex-degraded";

/// Connection settings for the cardex API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

/// Filters for `GET /cards`.
#[derive(Debug, Default)]
pub struct ListFilter {
  pub text:  Option<String>,
  pub tags:  Vec<Tag>,
  pub sort:  Option<SortKey>,
  pub order: Option<SortOrder>,
}

/// A read that may have been served from degraded storage.
#[derive(Debug)]
pub struct Fetched<T> {
  pub value:    T,
  pub degraded: bool,
}

/// Reply of `POST /ocr/extract`.
#[derive(Debug, Deserialize)]
pub struct Extraction {
  pub success: bool,
  #[serde(default)]
  pub data:    Option<CardFields>,
  #[serde(default)]
  pub error:   Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadReply {
  image_url: String,
}

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

/// Async HTTP client for the cardex JSON REST API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(90))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  /// Turn a non-success response into an error carrying the server's
  /// `{"error": ...}` message when there is one.
  async fn check(resp: Response, what: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let message = match resp.json::<ErrorBody>().await {
      Ok(body) => body.error,
      Err(_) => status.to_string(),
    };
    Err(anyhow!("{what} → {status}: {message}"))
  }

  fn is_degraded(resp: &Response) -> bool {
    resp.headers().contains_key(DEGRADED_HEADER)
  }

  // ── Cards ─────────────────────────────────────────────────────────────────

  /// `GET /api/cards`
  pub async fn list_cards(&self, filter: &ListFilter) -> Result<Fetched<Vec<Card>>> {
    let mut query: Vec<(&str, String)> = Vec::new();
    if let Some(text) = &filter.text {
      query.push(("text", text.clone()));
    }
    if !filter.tags.is_empty() {
      let tags = filter.tags.iter().map(Tag::to_string).collect::<Vec<_>>();
      query.push(("tags", tags.join(",")));
    }
    if let Some(sort) = filter.sort {
      query.push(("sort", sort.to_string()));
    }
    if let Some(order) = filter.order {
      query.push(("order", order.to_string()));
    }

    let resp = self
      .client
      .get(self.url("/cards"))
      .query(&query)
      .send()
      .await
      .context("GET /cards failed")?;
    let resp = Self::check(resp, "GET /cards").await?;
    let degraded = Self::is_degraded(&resp);
    let value = resp.json().await.context("deserialising cards")?;
    Ok(Fetched { value, degraded })
  }

  /// `GET /api/cards/:id`
  pub async fn get_card(&self, id: &CardId) -> Result<Card> {
    let resp = self
      .client
      .get(self.url(&format!("/cards/{id}")))
      .send()
      .await
      .context("GET /cards/:id failed")?;
    let resp = Self::check(resp, "GET /cards/:id").await?;
    resp.json().await.context("deserialising card")
  }

  /// `POST /api/cards`
  pub async fn create_card(&self, card: &NewCard) -> Result<Card> {
    let resp = self
      .client
      .post(self.url("/cards"))
      .json(card)
      .send()
      .await
      .context("POST /cards failed")?;
    let resp = Self::check(resp, "POST /cards").await?;
    resp.json().await.context("deserialising created card")
  }

  /// `DELETE /api/cards/:id`
  pub async fn delete_card(&self, id: &CardId) -> Result<()> {
    let resp = self
      .client
      .delete(self.url(&format!("/cards/{id}")))
      .send()
      .await
      .context("DELETE /cards/:id failed")?;
    Self::check(resp, "DELETE /cards/:id").await?;
    Ok(())
  }

  /// `DELETE /api/cards`
  pub async fn clear_cards(&self) -> Result<()> {
    let resp = self
      .client
      .delete(self.url("/cards"))
      .send()
      .await
      .context("DELETE /cards failed")?;
    Self::check(resp, "DELETE /cards").await?;
    Ok(())
  }

  // ── Stats & export ────────────────────────────────────────────────────────

  /// `GET /api/stats`
  pub async fn stats(&self) -> Result<Fetched<Statistics>> {
    let resp = self
      .client
      .get(self.url("/stats"))
      .send()
      .await
      .context("GET /stats failed")?;
    let resp = Self::check(resp, "GET /stats").await?;
    let degraded = Self::is_degraded(&resp);
    let value = resp.json().await.context("deserialising statistics")?;
    Ok(Fetched { value, degraded })
  }

  /// `GET /api/export?format=<format>`
  pub async fn export(&self, format: Format) -> Result<Vec<u8>> {
    let resp = self
      .client
      .get(self.url("/export"))
      .query(&[("format", format.to_string())])
      .send()
      .await
      .context("GET /export failed")?;
    let resp = Self::check(resp, "GET /export").await?;
    let bytes = resp.bytes().await.context("reading export body")?;
    Ok(bytes.to_vec())
  }

  // ── Scanning ──────────────────────────────────────────────────────────────

  /// `POST /api/upload`
  pub async fn upload_image(&self, base64_image: &str) -> Result<String> {
    let resp = self
      .client
      .post(self.url("/upload"))
      .json(&json!({ "base64Image": base64_image }))
      .send()
      .await
      .context("POST /upload failed")?;
    let resp = Self::check(resp, "POST /upload").await?;
    let reply: UploadReply = resp.json().await.context("deserialising upload reply")?;
    Ok(reply.image_url)
  }

  /// `POST /api/ocr/extract`
  pub async fn extract(&self, image_url: &str) -> Result<Extraction> {
    let resp = self
      .client
      .post(self.url("/ocr/extract"))
      .json(&json!({ "imageUrl": image_url }))
      .send()
      .await
      .context("POST /ocr/extract failed")?;
    let resp = Self::check(resp, "POST /ocr/extract").await?;
    resp.json().await.context("deserialising extraction")
  }
}
