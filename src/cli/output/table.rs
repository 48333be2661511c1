//! Table output for stored records using comfy-table.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};

use crate::cli::output::truncate;
use crate::domain::models::{Completion, StoredRecord};

const PREVIEW_CHARS: usize = 48;

/// One row per stored date: date, completion, length, id and a preview.
pub fn format_records(records: &[StoredRecord], use_colors: bool) -> String {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Date").add_attribute(Attribute::Bold),
        Cell::new("Completion").add_attribute(Attribute::Bold),
        Cell::new("Chars").add_attribute(Attribute::Bold),
        Cell::new("ID").add_attribute(Attribute::Bold),
        Cell::new("Answer").add_attribute(Attribute::Bold),
    ]);

    for stored in records {
        let record = &stored.record;
        let completion = Cell::new(record.completion.as_str());
        let completion = if use_colors {
            completion.fg(completion_color(record.completion))
        } else {
            completion
        };
        let id = stored.id.to_string();
        let preview = truncate(&record.answer.replace('\n', " "), PREVIEW_CHARS);

        table.add_row(vec![
            Cell::new(record.date),
            completion,
            Cell::new(record.answer.chars().count()),
            Cell::new(&id[..8]),
            Cell::new(preview),
        ]);
    }

    table.to_string()
}

fn completion_color(completion: Completion) -> Color {
    match completion {
        Completion::Stable => Color::Green,
        Completion::Partial => Color::Yellow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{DateKey, InteractionOutcome, InteractionRecord, StoredId};
    use chrono::Utc;

    #[test]
    fn test_format_records_contains_rows() {
        let record = InteractionRecord::new(
            DateKey::from_ymd(2024, 5, 6).unwrap(),
            InteractionOutcome {
                prompt: "p".into(),
                answer: "line one\nline two".into(),
                completion: Completion::Partial,
            },
        );
        let stored = StoredRecord {
            id: StoredId::new(),
            created_at: Utc::now(),
            record,
        };

        let out = format_records(&[stored], false);
        assert!(out.contains("2024-05-06"));
        assert!(out.contains("partial"));
        assert!(out.contains("line one line two"));
    }
}
