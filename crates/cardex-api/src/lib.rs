//! JSON REST API for Cardex.
//!
//! Exposes an axum [`Router`] backed by a [`CardRepository`] over any
//! [`BlobStore`], plus the scanning routes backed by an [`Extractor`] and an
//! [`Uploader`]. Auth, TLS and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", cardex_api::api_router(repo, extractor, uploader))
//! ```

pub mod cards;
pub mod error;
pub mod scan;

use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use cardex_core::{CardRepository, store::BlobStore};
use cardex_extract::{Extractor, Uploader};

pub use error::ApiError;
pub use scan::ScanState;

/// Routes over the card repository: `/cards`, `/stats` and `/export`.
pub fn cards_router<B>(repo: Arc<CardRepository<B>>) -> Router<()>
where
  B: BlobStore + 'static,
{
  Router::new()
    .route(
      "/cards",
      get(cards::list::<B>)
        .post(cards::create::<B>)
        .delete(cards::clear::<B>),
    )
    .route(
      "/cards/{id}",
      get(cards::get_one::<B>)
        .put(cards::update_one::<B>)
        .delete(cards::delete_one::<B>),
    )
    .route("/stats", get(cards::stats::<B>))
    .route("/export", get(cards::export::<B>))
    .with_state(repo)
}

/// Routes for the scanning flow: `/upload` and `/ocr/extract`.
pub fn scan_router<E, U>(state: ScanState<E, U>) -> Router<()>
where
  E: Extractor + 'static,
  U: Uploader + 'static,
{
  Router::new()
    .route("/upload", post(scan::upload::<E, U>))
    .route("/ocr/extract", post(scan::extract::<E, U>))
    .layer(DefaultBodyLimit::max(scan::MAX_UPLOAD_BYTES))
    .with_state(state)
}

/// Build the complete API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<B, E, U>(
  repo: Arc<CardRepository<B>>,
  extractor: Arc<E>,
  uploader: Arc<U>,
) -> Router<()>
where
  B: BlobStore + 'static,
  E: Extractor + 'static,
  U: Uploader + 'static,
{
  cards_router(repo).merge(scan_router(ScanState { extractor, uploader }))
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use cardex_core::{CardFields, memory::MemoryBlobStore};
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;

  // ── Fakes ───────────────────────────────────────────────────────────────────

  struct FakeExtractor;

  impl Extractor for FakeExtractor {
    async fn extract(&self, image_url: &str) -> cardex_extract::Result<CardFields> {
      if image_url.contains("blurry") {
        return Err(cardex_extract::Error::ExtractionFailed(
          "model returned no content".into(),
        ));
      }
      Ok(CardFields {
        full_name: "Alice Smith".into(),
        mobile_number: "+966512345678".into(),
        email: "alice@acme.com".into(),
        ..Default::default()
      })
    }
  }

  struct FakeUploader {
    fail: bool,
  }

  impl Uploader for FakeUploader {
    async fn upload(&self, image: Vec<u8>) -> cardex_extract::Result<String> {
      if self.fail {
        return Err(cardex_extract::Error::UploadFailed("service down".into()));
      }
      Ok(format!("https://cdn.example.com/card-{}.jpg", image.len()))
    }
  }

  struct Harness {
    app:   Router,
    store: MemoryBlobStore,
  }

  fn harness_with(fail_upload: bool) -> Harness {
    let store = MemoryBlobStore::new();
    let repo = Arc::new(CardRepository::new(store.clone()));
    let app = api_router(
      repo,
      Arc::new(FakeExtractor),
      Arc::new(FakeUploader { fail: fail_upload }),
    );
    Harness { app, store }
  }

  fn harness() -> Harness { harness_with(false) }

  async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
      Some(json) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(req).await.unwrap()
  }

  async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn create(app: &Router, body: Value) -> Value {
    let resp = send(app, "POST", "/cards", Some(body)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    json_body(resp).await
  }

  // ── Cards ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_then_get_round_trips() {
    let h = harness();
    let card = create(
      &h.app,
      json!({ "fullName": " Alice ", "email": "ALICE@ACME.COM", "tags": ["VIP"] }),
    )
    .await;
    assert_eq!(card["fullName"], "Alice");
    assert_eq!(card["email"], "alice@acme.com");
    assert_eq!(card["tags"], json!(["VIP"]));

    let id = card["id"].as_str().unwrap();
    let resp = send(&h.app, "GET", &format!("/cards/{id}"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await, card);
  }

  #[tokio::test]
  async fn duplicate_mobile_is_409() {
    let h = harness();
    create(&h.app, json!({ "fullName": "A", "mobileNumber": "+1555" })).await;

    let resp = send(
      &h.app,
      "POST",
      "/cards",
      Some(json!({ "fullName": "B", "mobileNumber": "+1555" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body = json_body(resp).await;
    assert!(body["error"].as_str().unwrap().contains("+1555"));
  }

  #[tokio::test]
  async fn missing_card_is_404() {
    let h = harness();
    let resp = send(&h.app, "GET", "/cards/nope", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp =
      send(&h.app, "PUT", "/cards/nope", Some(json!({ "fullName": "X" }))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn update_keeps_id_and_date() {
    let h = harness();
    let card = create(&h.app, json!({ "fullName": "Alice" })).await;
    let id = card["id"].as_str().unwrap();

    let resp = send(
      &h.app,
      "PUT",
      &format!("/cards/{id}"),
      Some(json!({ "fullName": "Alice Smith", "company": "ignored" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = json_body(resp).await;
    assert_eq!(updated["id"], card["id"]);
    assert_eq!(updated["dateAdded"], card["dateAdded"]);
    assert_eq!(updated["fullName"], "Alice Smith");
  }

  #[tokio::test]
  async fn delete_and_clear_are_204() {
    let h = harness();
    let card = create(&h.app, json!({ "fullName": "Alice" })).await;
    create(&h.app, json!({ "fullName": "Bob" })).await;
    let id = card["id"].as_str().unwrap();

    let resp = send(&h.app, "DELETE", &format!("/cards/{id}"), None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = send(&h.app, "DELETE", &format!("/cards/{id}"), None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let list = json_body(send(&h.app, "GET", "/cards", None).await).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let resp = send(&h.app, "DELETE", "/cards", None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let list = json_body(send(&h.app, "GET", "/cards", None).await).await;
    assert_eq!(list, json!([]));
  }

  #[tokio::test]
  async fn list_filters_and_sorts() {
    let h = harness();
    create(&h.app, json!({ "fullName": "carol", "companyName": "Acme" })).await;
    create(
      &h.app,
      json!({ "fullName": "Alice", "companyName": "Acme", "tags": ["Client"] }),
    )
    .await;
    create(&h.app, json!({ "fullName": "Bob", "companyName": "Globex" })).await;

    let names = |v: Value| {
      v.as_array()
        .unwrap()
        .iter()
        .map(|c| c["fullName"].as_str().unwrap().to_owned())
        .collect::<Vec<_>>()
    };

    let resp = send(&h.app, "GET", "/cards?sort=name", None).await;
    assert_eq!(names(json_body(resp).await), ["Alice", "Bob", "carol"]);

    let resp = send(&h.app, "GET", "/cards?sort=name&order=desc", None).await;
    assert_eq!(names(json_body(resp).await), ["carol", "Bob", "Alice"]);

    let resp = send(&h.app, "GET", "/cards?sort=company", None).await;
    assert_eq!(names(json_body(resp).await), ["carol", "Alice", "Bob"]);

    let resp = send(&h.app, "GET", "/cards?sort=company&order=desc", None).await;
    assert_eq!(names(json_body(resp).await), ["Bob", "carol", "Alice"]);

    let resp = send(&h.app, "GET", "/cards?text=acme&sort=name", None).await;
    assert_eq!(names(json_body(resp).await), ["Alice", "carol"]);

    let resp = send(&h.app, "GET", "/cards?tags=client", None).await;
    assert_eq!(names(json_body(resp).await), ["Alice"]);

    let resp = send(&h.app, "GET", "/cards?tags=Bogus", None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn unavailable_storage_degrades_reads() {
    let h = harness();
    create(&h.app, json!({ "fullName": "Alice" })).await;
    h.store.set_unavailable(true);

    let resp = send(&h.app, "GET", "/cards", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key(cards::DEGRADED_HEADER));
    assert_eq!(json_body(resp).await, json!([]));

    let resp = send(&h.app, "GET", "/stats", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key(cards::DEGRADED_HEADER));

    let resp = send(&h.app, "GET", "/export?format=csv", None).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let resp =
      send(&h.app, "POST", "/cards", Some(json!({ "fullName": "Bob" }))).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[tokio::test]
  async fn stats_counts_cards() {
    let h = harness();
    create(&h.app, json!({ "fullName": "A", "companyName": "Acme" })).await;
    create(&h.app, json!({ "fullName": "B", "companyName": "Acme" })).await;

    let stats = json_body(send(&h.app, "GET", "/stats", None).await).await;
    assert_eq!(stats["totalCards"], 2);
    assert_eq!(stats["companiesCount"], 1);
    assert_eq!(stats["recentCount"], 2);
    assert_eq!(stats["topCompanies"], json!([{ "name": "Acme", "count": 2 }]));
  }

  #[tokio::test]
  async fn export_sets_download_headers() {
    let h = harness();
    create(&h.app, json!({ "fullName": "Alice", "notes": "says \"hi\"" })).await;

    let resp = send(&h.app, "GET", "/export?format=csv", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/csv");
    assert_eq!(
      resp.headers()[header::CONTENT_DISPOSITION],
      "attachment; filename=\"business-cards.csv\""
    );
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = std::str::from_utf8(&bytes).unwrap();
    assert!(text.starts_with("Company Name,"));
    assert!(text.contains("\"says \"\"hi\"\"\""));

    let resp = send(&h.app, "GET", "/export?format=xlsx", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"PK"));

    let resp = send(&h.app, "GET", "/export?format=pdf", None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Scanning ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn upload_returns_public_url() {
    let h = harness();
    let resp = send(
      &h.app,
      "POST",
      "/upload",
      Some(json!({ "base64Image": "data:image/jpeg;base64,/9j/AA==" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["imageUrl"], "https://cdn.example.com/card-4.jpg");
  }

  #[tokio::test]
  async fn upload_rejects_missing_or_bad_image() {
    let h = harness();
    let resp = send(&h.app, "POST", "/upload", Some(json!({}))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp =
      send(&h.app, "POST", "/upload", Some(json!({ "base64Image": "!!" }))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn upload_failure_is_502() {
    let h = harness_with(true);
    let resp = send(
      &h.app,
      "POST",
      "/upload",
      Some(json!({ "base64Image": "/9j/AA==" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
  }

  #[tokio::test]
  async fn extract_reports_success_and_failure_in_body() {
    let h = harness();
    let resp = send(
      &h.app,
      "POST",
      "/ocr/extract",
      Some(json!({ "imageUrl": "https://cdn.example.com/card.jpg" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["fullName"], "Alice Smith");

    let resp = send(
      &h.app,
      "POST",
      "/ocr/extract",
      Some(json!({ "imageUrl": "https://cdn.example.com/blurry.jpg" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().is_some());
  }

  #[tokio::test]
  async fn extract_rejects_non_http_urls() {
    let h = harness();
    for body in [json!({}), json!({ "imageUrl": "file:///tmp/card.jpg" })] {
      let resp = send(&h.app, "POST", "/ocr/extract", Some(body)).await;
      assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
  }
}
