//! Card types — the business-card record and its inputs.
//!
//! A [`Card`] is created from a [`NewCard`] by the repository, which assigns
//! the id and the `date_added` timestamp. Both are immutable afterwards.

use std::{collections::BTreeSet, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Identity ────────────────────────────────────────────────────────────────

/// Opaque card identifier.
///
/// New ids are hyphenated UUIDv4 strings. Older stores used other string
/// ids, which are kept as-is.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
  pub fn generate() -> Self { Self(Uuid::new_v4().hyphenated().to_string()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for CardId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<String> for CardId {
  fn from(s: String) -> Self { Self(s) }
}

impl From<&str> for CardId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

// ─── Tags ────────────────────────────────────────────────────────────────────

/// A label from the fixed tag vocabulary.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Tag {
  #[serde(rename = "VIP")]
  #[strum(serialize = "VIP")]
  Vip,
  #[serde(rename = "Follow-up")]
  #[strum(serialize = "Follow-up")]
  FollowUp,
  Important,
  Partner,
  Client,
}

// ─── Extracted fields ────────────────────────────────────────────────────────

/// The fields an extraction pass can recover from a card photograph.
///
/// Values come from an untrusted source; run [`CardFields::sanitized`]
/// before handing them to the repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardFields {
  pub company_name:  String,
  pub full_name:     String,
  pub first_name:    String,
  pub last_name:     String,
  pub job_title:     String,
  pub department:    String,
  pub mobile_number: String,
  pub phone_number:  String,
  pub email:         String,
}

impl CardFields {
  /// Trim every field and lowercase the email address.
  pub fn sanitized(self) -> Self {
    Self {
      company_name:  trimmed(self.company_name),
      full_name:     trimmed(self.full_name),
      first_name:    trimmed(self.first_name),
      last_name:     trimmed(self.last_name),
      job_title:     trimmed(self.job_title),
      department:    trimmed(self.department),
      mobile_number: trimmed(self.mobile_number),
      phone_number:  trimmed(self.phone_number),
      email:         self.email.trim().to_lowercase(),
    }
  }
}

fn trimmed(s: String) -> String { s.trim().to_owned() }

// ─── NewCard ─────────────────────────────────────────────────────────────────

/// Input to [`crate::repository::CardRepository::create`].
/// `id` and `date_added` are always set by the repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewCard {
  pub company_name:  String,
  pub full_name:     String,
  pub first_name:    String,
  pub last_name:     String,
  pub job_title:     String,
  pub department:    String,
  pub mobile_number: String,
  pub phone_number:  String,
  pub email:         String,
  pub address:       String,
  pub website:       String,
  pub notes:         String,
  #[serde(alias = "imageUri")]
  pub image_source:  Option<String>,
  pub tags:          BTreeSet<Tag>,
}

impl NewCard {
  /// Start a card from extracted fields; the remaining fields stay empty.
  pub fn from_fields(fields: CardFields) -> Self {
    Self {
      company_name: fields.company_name,
      full_name: fields.full_name,
      first_name: fields.first_name,
      last_name: fields.last_name,
      job_title: fields.job_title,
      department: fields.department,
      mobile_number: fields.mobile_number,
      phone_number: fields.phone_number,
      email: fields.email,
      ..Self::default()
    }
  }

  /// Trim all text fields and lowercase the email. An image reference that
  /// is blank after trimming is dropped.
  pub fn sanitized(self) -> Self {
    Self {
      company_name:  trimmed(self.company_name),
      full_name:     trimmed(self.full_name),
      first_name:    trimmed(self.first_name),
      last_name:     trimmed(self.last_name),
      job_title:     trimmed(self.job_title),
      department:    trimmed(self.department),
      mobile_number: trimmed(self.mobile_number),
      phone_number:  trimmed(self.phone_number),
      email:         self.email.trim().to_lowercase(),
      address:       trimmed(self.address),
      website:       trimmed(self.website),
      notes:         trimmed(self.notes),
      image_source:  self
        .image_source
        .map(trimmed)
        .filter(|s| !s.is_empty()),
      tags:          self.tags,
    }
  }
}

// ─── Card ────────────────────────────────────────────────────────────────────

/// One stored business card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
  pub id:            CardId,
  #[serde(default)]
  pub company_name:  String,
  #[serde(default)]
  pub full_name:     String,
  #[serde(default)]
  pub first_name:    String,
  #[serde(default)]
  pub last_name:     String,
  #[serde(default)]
  pub job_title:     String,
  #[serde(default)]
  pub department:    String,
  /// Unique among stored cards when non-empty.
  #[serde(default)]
  pub mobile_number: String,
  #[serde(default)]
  pub phone_number:  String,
  #[serde(default)]
  pub email:         String,
  #[serde(default)]
  pub address:       String,
  #[serde(default)]
  pub website:       String,
  #[serde(default)]
  pub notes:         String,
  #[serde(default, alias = "imageUri", skip_serializing_if = "Option::is_none")]
  pub image_source:  Option<String>,
  #[serde(default)]
  pub tags:          BTreeSet<Tag>,
  pub date_added:    DateTime<Utc>,
}

impl Card {
  /// Build a card with a fresh id. The input is taken verbatim.
  pub fn from_new(input: NewCard, date_added: DateTime<Utc>) -> Self {
    Self {
      id: CardId::generate(),
      company_name: input.company_name,
      full_name: input.full_name,
      first_name: input.first_name,
      last_name: input.last_name,
      job_title: input.job_title,
      department: input.department,
      mobile_number: input.mobile_number,
      phone_number: input.phone_number,
      email: input.email,
      address: input.address,
      website: input.website,
      notes: input.notes,
      image_source: input.image_source,
      tags: input.tags,
      date_added,
    }
  }

  pub fn has_tag(&self, tag: Tag) -> bool { self.tags.contains(&tag) }

  /// Whether `mobile` collides with this card's number. Empty numbers never
  /// collide.
  pub fn mobile_conflicts_with(&self, mobile: &str) -> bool {
    !mobile.is_empty() && self.mobile_number == mobile
  }
}
