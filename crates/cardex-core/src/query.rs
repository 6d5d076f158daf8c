//! Search, filtering and ordering over card lists.
//!
//! Everything here is a pure pass over a slice; the repository feeds it the
//! stored list and callers may also use it on lists they already hold.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unicode_normalization::{UnicodeNormalization as _, char::is_combining_mark};

use crate::card::{Card, Tag};

// ─── Free-text search ────────────────────────────────────────────────────────

/// Whether `card` matches the free-text `query`.
///
/// Name, company, title, department and email fields match
/// case-insensitively; the mobile number matches case-sensitively. An empty
/// query matches every card.
pub fn matches_text(card: &Card, query: &str) -> bool {
  if query.is_empty() {
    return true;
  }
  let folded = query.to_lowercase();
  let folded_fields = [
    &card.company_name,
    &card.full_name,
    &card.first_name,
    &card.last_name,
    &card.job_title,
    &card.department,
    &card.email,
  ];

  folded_fields
    .iter()
    .any(|field| field.to_lowercase().contains(&folded))
    || card.mobile_number.contains(query)
}

// ─── Sorting ─────────────────────────────────────────────────────────────────

/// The field a card list is ordered by.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortKey {
  /// `full_name`
  #[default]
  Name,
  /// `company_name`
  Company,
  /// `date_added`
  Date,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
  #[default]
  Asc,
  Desc,
}

/// Base letters of `s`: canonically decomposed, accents dropped, lowercased.
fn base_letters(s: &str) -> impl Iterator<Item = char> + '_ {
  s.nfd()
    .filter(|c| !is_combining_mark(*c))
    .flat_map(char::to_lowercase)
}

/// Compare two display strings the way a user-facing list expects.
///
/// Base letters compare first, ignoring case and accents, so `Émile` sorts
/// between `Adam` and `Fred`. The exact text breaks ties.
pub fn compare_text(a: &str, b: &str) -> Ordering {
  base_letters(a)
    .cmp(base_letters(b))
    .then_with(|| a.cmp(b))
}

fn compare_by(a: &Card, b: &Card, key: SortKey) -> Ordering {
  match key {
    SortKey::Name => compare_text(&a.full_name, &b.full_name),
    SortKey::Company => compare_text(&a.company_name, &b.company_name),
    SortKey::Date => a.date_added.cmp(&b.date_added),
  }
}

/// Sort `cards` in place. The sort is stable in both directions: cards with
/// equal keys keep their relative input order.
pub fn sort_cards(cards: &mut [Card], key: SortKey, order: SortOrder) {
  match order {
    SortOrder::Asc => cards.sort_by(|a, b| compare_by(a, b, key)),
    SortOrder::Desc => cards.sort_by(|a, b| compare_by(b, a, key)),
  }
}

// ─── Structured query ────────────────────────────────────────────────────────

/// Parameters for [`CardRepository::query`](crate::repository::CardRepository::query).
#[derive(Debug, Clone, Default)]
pub struct CardQuery {
  /// Free-text filter; see [`matches_text`].
  pub text:         Option<String>,
  /// Exact company name.
  pub company:      Option<String>,
  /// Exact department name.
  pub department:   Option<String>,
  /// Returned cards carry all of these tags.
  pub tags:         Vec<Tag>,
  /// Inclusive lower bound on `date_added`.
  pub added_after:  Option<DateTime<Utc>>,
  /// Exclusive upper bound on `date_added`.
  pub added_before: Option<DateTime<Utc>>,
  pub sort:         Option<(SortKey, SortOrder)>,
}

impl CardQuery {
  pub fn text(query: impl Into<String>) -> Self {
    Self { text: Some(query.into()), ..Self::default() }
  }

  pub fn sorted(mut self, key: SortKey, order: SortOrder) -> Self {
    self.sort = Some((key, order));
    self
  }

  /// Whether `card` passes every filter in this query (sorting aside).
  pub fn matches(&self, card: &Card) -> bool {
    if let Some(text) = &self.text
      && !matches_text(card, text)
    {
      return false;
    }
    if let Some(company) = &self.company
      && card.company_name != *company
    {
      return false;
    }
    if let Some(department) = &self.department
      && card.department != *department
    {
      return false;
    }
    if !self.tags.iter().all(|t| card.has_tag(*t)) {
      return false;
    }
    if let Some(after) = self.added_after
      && card.date_added < after
    {
      return false;
    }
    if let Some(before) = self.added_before
      && card.date_added >= before
    {
      return false;
    }
    true
  }

  /// Filter then sort `cards`.
  pub fn apply(&self, cards: Vec<Card>) -> Vec<Card> {
    let mut out: Vec<Card> =
      cards.into_iter().filter(|c| self.matches(c)).collect();
    if let Some((key, order)) = self.sort {
      sort_cards(&mut out, key, order);
    }
    out
  }
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;
  use crate::card::{CardId, NewCard};

  fn card(full_name: &str) -> Card {
    Card::from_new(
      NewCard { full_name: full_name.into(), ..NewCard::default() },
      Utc::now(),
    )
  }

  #[test]
  fn empty_query_matches_everything() {
    assert!(matches_text(&card("A"), ""));
    assert!(matches_text(&card(""), ""));
  }

  #[test]
  fn text_fields_match_case_insensitively() {
    let mut c = card("Alice Smith");
    c.company_name = "Globex Corp".into();
    c.email = "alice@globex.test".into();

    assert!(matches_text(&c, "ALICE"));
    assert!(matches_text(&c, "globex c"));
    assert!(matches_text(&c, "@GLOBEX"));
    assert!(!matches_text(&c, "initech"));
  }

  #[test]
  fn mobile_number_matches_case_sensitively() {
    let mut c = card("");
    c.mobile_number = "+966-EXT-12".into();

    assert!(matches_text(&c, "EXT-1"));
    assert!(!matches_text(&c, "ext-1"));
  }

  #[test]
  fn notes_and_address_are_not_searched() {
    let mut c = card("Bob");
    c.notes = "met at expo".into();
    c.address = "Main Street".into();
    assert!(!matches_text(&c, "expo"));
    assert!(!matches_text(&c, "main"));
  }

  #[test]
  fn name_sort_is_stable() {
    let mut b = card("B");
    let mut a1 = card("A");
    let mut a2 = card("A");
    b.id = CardId::from("b");
    a1.id = CardId::from("a1");
    a2.id = CardId::from("a2");

    let mut cards = vec![b, a1, a2];
    sort_cards(&mut cards, SortKey::Name, SortOrder::Asc);
    let ids: Vec<_> = cards.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["a1", "a2", "b"]);

    sort_cards(&mut cards, SortKey::Name, SortOrder::Desc);
    let ids: Vec<_> = cards.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["b", "a1", "a2"]);
  }

  #[test]
  fn text_comparison_ignores_case_first() {
    assert_eq!(compare_text("alice", "Bob"), Ordering::Less);
    assert_eq!(compare_text("Zed", "adam"), Ordering::Greater);
    assert_ne!(compare_text("a", "A"), Ordering::Equal);
  }

  #[test]
  fn accented_names_sort_by_base_letter() {
    let mut cards = vec![card("Zed"), card("Émile"), card("Fred"), card("Adam")];
    sort_cards(&mut cards, SortKey::Name, SortOrder::Asc);
    let names: Vec<_> = cards.iter().map(|c| c.full_name.as_str()).collect();
    assert_eq!(names, ["Adam", "Émile", "Fred", "Zed"]);

    assert_eq!(compare_text("Ångström", "Anders"), Ordering::Greater);
    assert_eq!(compare_text("émile", "Emile"), Ordering::Greater);
    assert_eq!(compare_text("Zoë", "Zoe"), Ordering::Greater);
  }

  #[test]
  fn company_sort_is_stable_both_ways() {
    let with_company = |id: &str, company: &str| {
      let mut c = card(id);
      c.id = CardId::from(id);
      c.company_name = company.into();
      c
    };
    let mut cards = vec![
      with_company("g1", "Globex"),
      with_company("a1", "acme"),
      with_company("i1", "Initech"),
      with_company("g2", "Globex"),
      with_company("a2", "acme"),
    ];

    sort_cards(&mut cards, SortKey::Company, SortOrder::Asc);
    let ids: Vec<_> = cards.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["a1", "a2", "g1", "g2", "i1"]);

    sort_cards(&mut cards, SortKey::Company, SortOrder::Desc);
    let ids: Vec<_> = cards.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["i1", "g1", "g2", "a1", "a2"]);
  }

  #[test]
  fn date_sort_orders_by_date_added() {
    let now = Utc::now();
    let mut old = card("old");
    old.date_added = now - Duration::days(3);
    let new = card("new");

    let mut cards = vec![new, old];
    sort_cards(&mut cards, SortKey::Date, SortOrder::Asc);
    assert_eq!(cards[0].full_name, "old");
    sort_cards(&mut cards, SortKey::Date, SortOrder::Desc);
    assert_eq!(cards[0].full_name, "new");
  }

  #[test]
  fn query_combines_filters() {
    let now = Utc::now();
    let mut a = card("Alice");
    a.company_name = "Acme".into();
    a.tags.insert(Tag::Vip);
    let mut b = card("Bob");
    b.company_name = "Acme".into();
    let mut c = card("Carol");
    c.company_name = "Globex".into();
    c.tags.insert(Tag::Vip);
    c.date_added = now - Duration::days(40);

    let q = CardQuery {
      company: Some("Acme".into()),
      tags: vec![Tag::Vip],
      ..CardQuery::default()
    };
    let out = q.apply(vec![a.clone(), b.clone(), c.clone()]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].full_name, "Alice");

    let recent = CardQuery {
      added_after: Some(now - Duration::days(30)),
      ..CardQuery::default()
    }
    .sorted(SortKey::Name, SortOrder::Desc);
    let names: Vec<_> = recent
      .apply(vec![a, b, c])
      .into_iter()
      .map(|c| c.full_name)
      .collect();
    assert_eq!(names, ["Bob", "Alice"]);
  }
}
