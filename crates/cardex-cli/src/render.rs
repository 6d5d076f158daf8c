//! Plain-text rendering of cards and statistics for the terminal.

use std::fmt::Write as _;

use cardex_core::{Card, CardFields, stats::Statistics};

// ─── Lists ────────────────────────────────────────────────────────────────────

/// Truncate `s` to `width` characters, marking the cut with `…`.
fn fit(s: &str, width: usize) -> String {
  if s.chars().count() <= width {
    return s.to_string();
  }
  let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
  out.push('…');
  out
}

/// One line per card: id, name, company, mobile, tags.
pub fn card_table(cards: &[Card]) -> String {
  if cards.is_empty() {
    return "No cards.\n".to_string();
  }

  let mut out = String::new();
  let _ = writeln!(
    out,
    "{:<36}  {:<24}  {:<24}  {:<16}  TAGS",
    "ID", "NAME", "COMPANY", "MOBILE"
  );
  for card in cards {
    let tags = card
      .tags
      .iter()
      .map(ToString::to_string)
      .collect::<Vec<_>>()
      .join(", ");
    let _ = writeln!(
      out,
      "{:<36}  {:<24}  {:<24}  {:<16}  {tags}",
      card.id.as_str(),
      fit(&card.full_name, 24),
      fit(&card.company_name, 24),
      fit(&card.mobile_number, 16),
    );
  }
  out
}

// ─── Detail ───────────────────────────────────────────────────────────────────

fn field(out: &mut String, label: &str, value: &str) {
  if !value.is_empty() {
    let _ = writeln!(out, "{label:<14}{value}");
  }
}

fn fields_block(out: &mut String, f: &CardFields) {
  field(out, "Name", &f.full_name);
  field(out, "First name", &f.first_name);
  field(out, "Last name", &f.last_name);
  field(out, "Company", &f.company_name);
  field(out, "Job title", &f.job_title);
  field(out, "Department", &f.department);
  field(out, "Mobile", &f.mobile_number);
  field(out, "Phone", &f.phone_number);
  field(out, "Email", &f.email);
}

/// Every non-empty field of `card`.
pub fn card_detail(card: &Card) -> String {
  let mut out = String::new();
  field(&mut out, "ID", card.id.as_str());
  fields_block(&mut out, &CardFields {
    company_name:  card.company_name.clone(),
    full_name:     card.full_name.clone(),
    first_name:    card.first_name.clone(),
    last_name:     card.last_name.clone(),
    job_title:     card.job_title.clone(),
    department:    card.department.clone(),
    mobile_number: card.mobile_number.clone(),
    phone_number:  card.phone_number.clone(),
    email:         card.email.clone(),
  });
  field(&mut out, "Address", &card.address);
  field(&mut out, "Website", &card.website);
  field(&mut out, "Notes", &card.notes);
  if let Some(image) = &card.image_source {
    field(&mut out, "Image", image);
  }
  let tags = card
    .tags
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join(", ");
  field(&mut out, "Tags", &tags);
  field(&mut out, "Added", &card.date_added.to_rfc3339());
  out
}

/// Fields recovered from a scan.
pub fn extracted_fields(fields: &CardFields) -> String {
  let mut out = String::new();
  fields_block(&mut out, fields);
  if out.is_empty() {
    out.push_str("No text recognised.\n");
  }
  out
}

// ─── Statistics ───────────────────────────────────────────────────────────────

pub fn statistics(stats: &Statistics) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "Total cards     {}", stats.total_cards);
  let _ = writeln!(out, "Companies       {}", stats.companies_count);
  let _ = writeln!(out, "Departments     {}", stats.departments_count);
  let _ = writeln!(out, "VIP             {}", stats.vip_count);
  let _ = writeln!(out, "Added (30 days) {}", stats.recent_count);

  for (title, list) in [
    ("Top companies", &stats.top_companies),
    ("Top departments", &stats.top_departments),
  ] {
    if list.is_empty() {
      continue;
    }
    let _ = writeln!(out, "\n{title}");
    for entry in list {
      let _ = writeln!(out, "  {:>4}  {}", entry.count, entry.name);
    }
  }
  out
}
