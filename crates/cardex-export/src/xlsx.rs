//! XLSX serializer: one worksheet, a header row and one row per card.

use cardex_core::Card;
use rust_xlsxwriter::{Format, Workbook};

use crate::{HEADERS, error::Result, row};

/// Name of the single worksheet.
pub(crate) const SHEET_NAME: &str = "Business Cards";

/// Column widths in characters, aligned with [`HEADERS`].
const COLUMN_WIDTHS: [f64; 14] = [
  20.0, // Company Name
  20.0, // Full Name
  15.0, // First Name
  15.0, // Last Name
  20.0, // Job Title
  15.0, // Department
  15.0, // Mobile Number
  15.0, // Phone Number
  25.0, // Email
  30.0, // Address
  25.0, // Website
  30.0, // Notes
  15.0, // Tags
  20.0, // Date Added
];

pub(crate) fn to_xlsx(cards: &[Card]) -> Result<Vec<u8>> {
  let mut workbook = Workbook::new();
  let sheet = workbook.add_worksheet();
  sheet.set_name(SHEET_NAME)?;

  let bold = Format::new().set_bold();
  for (col, (header, width)) in HEADERS.iter().zip(COLUMN_WIDTHS).enumerate() {
    let col = col as u16;
    sheet.set_column_width(col, width)?;
    sheet.write_string_with_format(0, col, *header, &bold)?;
  }

  for (i, card) in cards.iter().enumerate() {
    let r = (i + 1) as u32;
    for (col, value) in row(card).iter().enumerate() {
      sheet.write_string(r, col as u16, value.as_str())?;
    }
  }

  Ok(workbook.save_to_buffer()?)
}
