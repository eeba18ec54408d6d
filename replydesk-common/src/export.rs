//! CSV export of reply records

use chrono::{DateTime, Local};

use crate::records::{ReplyRecord, StoreScope};
use crate::Result;

/// Column order of the exported file
pub const CSV_HEADER: [&str; 6] = ["store_id", "author", "starRating", "comment", "reply", "posted"];

/// UTF-8 byte-order mark, so spreadsheet tools pick the right encoding
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Serialize records to CSV (BOM + header + one row per record)
pub fn to_csv<'a, I>(records: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a ReplyRecord>,
{
    let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());
    writer.write_record(CSV_HEADER)?;

    for record in records {
        writer.write_record([
            record.store_id.as_deref().unwrap_or(""),
            record.author.as_str(),
            record.star_rating.as_str(),
            record.comment.as_str(),
            record.reply.as_str(),
            if record.posted { "true" } else { "false" },
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| crate::Error::Io(e.into_error()))
}

/// Download file name, e.g. `replies_shibuya_20240501_093000.csv`
pub fn export_filename(scope: &StoreScope, now: DateTime<Local>) -> String {
    let label: String = scope
        .label()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("replies_{}_{}.csv", label, now.format("%Y%m%d_%H%M%S"))
}
