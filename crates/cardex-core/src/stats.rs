//! Aggregate statistics over a card list.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::card::{Card, Tag};

/// Cards added within this window of the evaluation instant count as recent.
pub fn recent_window() -> Duration { Duration::days(30) }

/// How many entries the top-company and top-department lists hold.
pub const TOP_N: usize = 5;

/// A value and how many cards carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameCount {
  pub name:  String,
  pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
  pub total_cards:       usize,
  /// Distinct non-empty company names.
  pub companies_count:   usize,
  /// Distinct non-empty departments.
  pub departments_count: usize,
  pub vip_count:         usize,
  /// Cards with `date_added >= now - 30 days`.
  pub recent_count:      usize,
  pub top_companies:     Vec<NameCount>,
  pub top_departments:   Vec<NameCount>,
}

/// Compute [`Statistics`] for `cards` as of `now`.
///
/// Top lists are ordered by count descending; equal counts keep the order in
/// which the values first appear in `cards`.
pub fn compute_statistics(cards: &[Card], now: DateTime<Utc>) -> Statistics {
  let cutoff = now - recent_window();

  let companies = tally(cards.iter().map(|c| c.company_name.as_str()));
  let departments = tally(cards.iter().map(|c| c.department.as_str()));

  Statistics {
    total_cards:       cards.len(),
    companies_count:   distinct(cards.iter().map(|c| c.company_name.as_str())),
    departments_count: distinct(cards.iter().map(|c| c.department.as_str())),
    vip_count:         cards.iter().filter(|c| c.has_tag(Tag::Vip)).count(),
    recent_count:      cards.iter().filter(|c| c.date_added >= cutoff).count(),
    top_companies:     top(companies),
    top_departments:   top(departments),
  }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> usize {
  values.filter(|v| !v.is_empty()).collect::<HashSet<_>>().len()
}

/// Count non-empty values, preserving first-seen order.
fn tally<'a>(values: impl Iterator<Item = &'a str>) -> Vec<NameCount> {
  let mut index: HashMap<&str, usize> = HashMap::new();
  let mut counts: Vec<NameCount> = Vec::new();

  for value in values.filter(|v| !v.is_empty()) {
    match index.get(value).copied() {
      Some(i) => counts[i].count += 1,
      None => {
        index.insert(value, counts.len());
        counts.push(NameCount { name: value.to_owned(), count: 1 });
      }
    }
  }
  counts
}

fn top(mut counts: Vec<NameCount>) -> Vec<NameCount> {
  // Stable: ties stay in first-seen order.
  counts.sort_by(|a, b| b.count.cmp(&a.count));
  counts.truncate(TOP_N);
  counts
}
