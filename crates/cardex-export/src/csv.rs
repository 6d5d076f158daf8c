//! CSV serializer.
//!
//! One header line, then one line per card. Lines are joined with `\n` and
//! every data cell is double-quoted with embedded quotes doubled, so commas,
//! quotes and line breaks inside values survive a round trip through any
//! spreadsheet.

use cardex_core::Card;

use crate::{HEADERS, row};

// ─── Cell quoting ─────────────────────────────────────────────────────────────

/// Wrap `s` in double quotes, doubling any quote inside it.
fn quote(s: &str) -> String { format!("\"{}\"", s.replace('"', "\"\"")) }

// ─── Serializer ───────────────────────────────────────────────────────────────

pub(crate) fn to_csv(cards: &[Card]) -> String {
  let mut lines = Vec::with_capacity(cards.len() + 1);
  lines.push(HEADERS.join(","));

  for card in cards {
    let cells: Vec<String> = row(card).iter().map(|c| quote(c)).collect();
    lines.push(cells.join(","));
  }

  lines.join("\n")
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use cardex_core::{NewCard, Tag};
  use chrono::{TimeZone, Utc};

  use super::*;

  fn card() -> Card {
    Card::from_new(
      NewCard {
        company_name: "Acme, Inc.".into(),
        full_name: "Alice \"Al\" Smith".into(),
        mobile_number: "+1555".into(),
        tags: BTreeSet::from([Tag::Client, Tag::Vip]),
        ..NewCard::default()
      },
      Utc.with_ymd_and_hms(2024, 4, 5, 10, 0, 0).unwrap(),
    )
  }

  #[test]
  fn quote_doubles_embedded_quotes() {
    assert_eq!(quote("plain"), "\"plain\"");
    assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
  }

  #[test]
  fn empty_list_is_header_only() {
    let out = to_csv(&[]);
    assert_eq!(out.lines().count(), 1);
    assert_eq!(out.split(',').count(), 14);
    assert!(out.starts_with("Company Name,Full Name,First Name,"));
    assert!(out.ends_with(",Tags,Date Added"));
  }

  #[test]
  fn one_card_gives_two_lines_of_fourteen_fields() {
    let out = to_csv(&[card()]);
    let lines: Vec<_> = out.lines().collect();
    assert_eq!(lines.len(), 2);

    let data = lines[1];
    assert!(data.starts_with("\"Acme, Inc.\",\"Alice \"\"Al\"\" Smith\","));
    assert!(data.contains(",\"+1555\","));
    assert!(data.contains(",\"VIP, Client\","));
    assert!(data.ends_with(",\"2024-04-05T10:00:00.000Z\""));

    // Every cell is quoted, so fields are separated by `","` boundaries.
    let inner = &data[1..data.len() - 1];
    assert_eq!(inner.split("\",\"").count(), 14);
  }
}
