//! CSV and XLSX export for Cardex.
//!
//! Converts a list of [`cardex_core::Card`]s into file bytes. Pure
//! synchronous; no HTTP, file-system or database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use cardex_export::{Format, serialize};
//!
//! let bytes = serialize(&[], Format::Csv).unwrap();
//! assert!(bytes.starts_with(b"Company Name,"));
//! ```

mod csv;
pub mod error;
mod xlsx;

use cardex_core::Card;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

pub use error::{Error, Result};

// ─── Columns ─────────────────────────────────────────────────────────────────

/// Column headers shared by every export format, in output order.
pub const HEADERS: [&str; 14] = [
  "Company Name",
  "Full Name",
  "First Name",
  "Last Name",
  "Job Title",
  "Department",
  "Mobile Number",
  "Phone Number",
  "Email",
  "Address",
  "Website",
  "Notes",
  "Tags",
  "Date Added",
];

/// The 14 cell values for `card`, aligned with [`HEADERS`].
///
/// Tags are joined with `", "`; the date is RFC 3339 in UTC with
/// millisecond precision (`2024-04-05T10:00:00.000Z`).
pub fn row(card: &Card) -> [String; 14] {
  let tags = card
    .tags
    .iter()
    .map(|t| t.to_string())
    .collect::<Vec<_>>()
    .join(", ");

  [
    card.company_name.clone(),
    card.full_name.clone(),
    card.first_name.clone(),
    card.last_name.clone(),
    card.job_title.clone(),
    card.department.clone(),
    card.mobile_number.clone(),
    card.phone_number.clone(),
    card.email.clone(),
    card.address.clone(),
    card.website.clone(),
    card.notes.clone(),
    tags,
    card.date_added.to_rfc3339_opts(SecondsFormat::Millis, true),
  ]
}

// ─── Format ──────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Format {
  Csv,
  Xlsx,
}

impl Format {
  /// Default download file name.
  pub fn file_name(self) -> &'static str {
    match self {
      Self::Csv => "business-cards.csv",
      Self::Xlsx => "business-cards.xlsx",
    }
  }

  pub fn mime_type(self) -> &'static str {
    match self {
      Self::Csv => "text/csv",
      Self::Xlsx => {
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
      }
    }
  }
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Serialize `cards` in `format`.
pub fn serialize(cards: &[Card], format: Format) -> Result<Vec<u8>> {
  match format {
    Format::Csv => Ok(csv::to_csv(cards).into_bytes()),
    Format::Xlsx => xlsx::to_xlsx(cards),
  }
}
