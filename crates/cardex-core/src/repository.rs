//! [`CardRepository`] — the single owner of the stored card list.
//!
//! The whole list lives in one JSON blob. Every write reads the blob, checks
//! its invariants, and writes the full list back through
//! [`BlobStore::set`], which is atomic per key. Writes hold an async mutex for
//! the whole read-modify-write cycle so concurrent callers cannot race the
//! duplicate checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
  Error, Result,
  card::{Card, CardId, NewCard},
  query::{self, CardQuery},
  stats::{self, Statistics},
  store::BlobStore,
};

/// Blob key the card list is stored under.
pub const STORAGE_KEY: &str = "@business_cards";

/// Current version of the persisted card document.
pub const DOCUMENT_VERSION: u32 = 1;

// ─── Persisted document ──────────────────────────────────────────────────────

#[derive(Serialize)]
struct DocumentRef<'a> {
  version: u32,
  cards:   &'a [Card],
}

#[derive(Deserialize)]
struct Document {
  version: u32,
  cards:   Vec<Card>,
}

/// Older stores hold a bare JSON array with no version field.
#[derive(Deserialize)]
#[serde(untagged)]
enum Persisted {
  Versioned(Document),
  Unversioned(Vec<Card>),
}

fn decode(raw: &str) -> Result<Vec<Card>> {
  match serde_json::from_str::<Persisted>(raw) {
    Ok(Persisted::Versioned(doc)) if doc.version == DOCUMENT_VERSION => {
      Ok(doc.cards)
    }
    Ok(Persisted::Versioned(doc)) => Err(Error::UnsupportedVersion(doc.version)),
    Ok(Persisted::Unversioned(cards)) => Ok(cards),
    // Re-parse as the current format so the caller sees a useful message
    // rather than serde's untagged-enum error.
    Err(_) => Ok(serde_json::from_str::<Document>(raw)?.cards),
  }
}

fn encode(cards: &[Card]) -> Result<String> {
  Ok(serde_json::to_string(&DocumentRef { version: DOCUMENT_VERSION, cards })?)
}

// ─── Listing ─────────────────────────────────────────────────────────────────

/// The result of a read that degrades instead of failing.
///
/// When storage cannot be read, `cards` is empty and `degraded` holds the
/// error so the caller can tell the user.
#[derive(Debug, Default)]
pub struct Listing {
  pub cards:    Vec<Card>,
  pub degraded: Option<Error>,
}

impl Listing {
  pub fn is_degraded(&self) -> bool { self.degraded.is_some() }
}

// ─── Repository ──────────────────────────────────────────────────────────────

/// The card repository over a [`BlobStore`] backend.
pub struct CardRepository<B> {
  store:      B,
  key:        String,
  write_lock: Mutex<()>,
}

impl<B: BlobStore> CardRepository<B> {
  /// A repository storing its list under [`STORAGE_KEY`].
  pub fn new(store: B) -> Self { Self::with_key(store, STORAGE_KEY) }

  pub fn with_key(store: B, key: impl Into<String>) -> Self {
    Self { store, key: key.into(), write_lock: Mutex::new(()) }
  }

  pub fn store(&self) -> &B { &self.store }

  async fn load(&self) -> Result<Vec<Card>> {
    let raw = self.store.get(&self.key).await.map_err(Error::storage)?;
    match raw {
      Some(raw) => decode(&raw),
      None => Ok(Vec::new()),
    }
  }

  async fn persist(&self, cards: &[Card]) -> Result<()> {
    // Encode before touching the store so a failure leaves it unchanged.
    let blob = encode(cards)?;
    self.store.set(&self.key, blob).await.map_err(Error::storage)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// All cards in storage order, propagating storage failures.
  pub async fn try_list(&self) -> Result<Vec<Card>> { self.load().await }

  /// All cards in storage order. A storage failure is logged and yields an
  /// empty, degraded [`Listing`].
  pub async fn list(&self) -> Listing {
    match self.load().await {
      Ok(cards) => Listing { cards, degraded: None },
      Err(e) => {
        tracing::warn!(error = %e, "failed to load cards; returning empty list");
        Listing { cards: Vec::new(), degraded: Some(e) }
      }
    }
  }

  /// Look up a single card by id.
  pub async fn get(&self, id: &CardId) -> Result<Option<Card>> {
    Ok(self.load().await?.into_iter().find(|c| c.id == *id))
  }

  /// Cards matching the free-text `query`, in storage order.
  pub async fn search(&self, query: &str) -> Listing {
    let mut listing = self.list().await;
    listing.cards.retain(|c| query::matches_text(c, query));
    listing
  }

  /// Cards passing every filter in `query`, sorted if it asks for it.
  pub async fn query(&self, query: &CardQuery) -> Listing {
    let Listing { cards, degraded } = self.list().await;
    Listing { cards: query.apply(cards), degraded }
  }

  /// Statistics over every stored card as of `now`, alongside the degraded
  /// read error if storage could not be read.
  pub async fn statistics(
    &self,
    now: DateTime<Utc>,
  ) -> (Statistics, Option<Error>) {
    let Listing { cards, degraded } = self.list().await;
    (stats::compute_statistics(&cards, now), degraded)
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Insert a new card.
  ///
  /// Fails with [`Error::DuplicateMobile`] if another card has the same
  /// non-empty mobile number and with [`Error::DuplicateId`] if the id is
  /// taken. The stored list is unchanged on failure.
  pub async fn save(&self, card: Card) -> Result<()> {
    let _guard = self.write_lock.lock().await;
    let mut cards = self.load().await?;

    if cards.iter().any(|c| c.id == card.id) {
      tracing::debug!(id = %card.id, "rejected card with duplicate id");
      return Err(Error::DuplicateId(card.id));
    }
    if cards.iter().any(|c| c.mobile_conflicts_with(&card.mobile_number)) {
      tracing::debug!(id = %card.id, "rejected card with duplicate mobile number");
      return Err(Error::DuplicateMobile(card.mobile_number));
    }

    let id = card.id.clone();
    cards.push(card);
    self.persist(&cards).await?;
    tracing::debug!(%id, total = cards.len(), "saved card");
    Ok(())
  }

  /// Sanitise `input`, assign an id and `date_added = now`, and save it.
  pub async fn create(&self, input: NewCard) -> Result<Card> {
    let card = Card::from_new(input.sanitized(), Utc::now());
    self.save(card.clone()).await?;
    Ok(card)
  }

  /// Replace the card with id `id` by `card`, keeping its position.
  ///
  /// The stored id and `date_added` are kept whatever `card` carries. Fails
  /// with [`Error::NotFound`] if no card has this id and with
  /// [`Error::DuplicateMobile`] if the new mobile number belongs to another
  /// card.
  pub async fn update(&self, id: &CardId, mut card: Card) -> Result<Card> {
    let _guard = self.write_lock.lock().await;
    let mut cards = self.load().await?;

    let index = cards
      .iter()
      .position(|c| c.id == *id)
      .ok_or_else(|| Error::NotFound(id.clone()))?;

    let collides = cards
      .iter()
      .enumerate()
      .any(|(i, c)| i != index && c.mobile_conflicts_with(&card.mobile_number));
    if collides {
      tracing::debug!(%id, "rejected update with duplicate mobile number");
      return Err(Error::DuplicateMobile(card.mobile_number));
    }

    card.id = cards[index].id.clone();
    card.date_added = cards[index].date_added;
    cards[index] = card.clone();
    self.persist(&cards).await?;
    tracing::debug!(%id, "updated card");
    Ok(card)
  }

  /// Remove the card with id `id`. Returns whether a card was removed; an
  /// absent id is not an error.
  pub async fn delete(&self, id: &CardId) -> Result<bool> {
    let _guard = self.write_lock.lock().await;
    let mut cards = self.load().await?;

    let before = cards.len();
    cards.retain(|c| c.id != *id);
    let removed = cards.len() != before;

    self.persist(&cards).await?;
    tracing::debug!(%id, removed, "deleted card");
    Ok(removed)
  }

  /// Remove every card.
  pub async fn clear(&self) -> Result<()> {
    let _guard = self.write_lock.lock().await;
    self.store.remove(&self.key).await.map_err(Error::storage)?;
    tracing::debug!("cleared all cards");
    Ok(())
  }
}
