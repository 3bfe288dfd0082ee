use std::fmt::Write;

use crate::record::NormalizedRecord;

pub const PREVIEW_LIMIT: usize = 10;

pub fn render_preview(records: &[NormalizedRecord]) -> String {
    render_preview_with_limit(records, PREVIEW_LIMIT)
}

pub fn render_preview_with_limit(records: &[NormalizedRecord], limit: usize) -> String {
    let mut output = String::from("--- Preview ---\n");
    if records.is_empty() {
        output.push_str("(no records)\n");
        return output;
    }

    for (index, record) in records.iter().take(limit).enumerate() {
        let _ = writeln!(output, "{}. URL: {}", index + 1, record.url);
        let _ = writeln!(output, "   Title: {}", or_placeholder(&record.title));
        let _ = writeln!(
            output,
            "   Description: {}",
            or_placeholder(&record.description)
        );
        let _ = writeln!(output, "   Tags: {}", record.tags.join(", "));
        let _ = writeln!(output, "   List: {}", or_placeholder(&record.list));
    }
    if records.len() > limit {
        let _ = writeln!(output, "... and {} more records.", records.len() - limit);
    }
    output
}

fn or_placeholder(value: &str) -> &str {
    if value.is_empty() { "N/A" } else { value }
}

#[cfg(test)]
mod tests {
    use super::{render_preview, render_preview_with_limit};
    use crate::record::NormalizedRecord;

    fn record(index: usize) -> NormalizedRecord {
        NormalizedRecord {
            url: format!("https://site{index}.test"),
            title: format!("Site {index}"),
            description: String::new(),
            tags: vec!["a".to_string(), "b".to_string()],
            list: "reading".to_string(),
            created_at: 0,
        }
    }

    fn entry_count(text: &str) -> usize {
        text.lines().filter(|line| line.contains(". URL: ")).count()
    }

    #[test]
    fn caps_at_ten_entries_and_reports_remainder() {
        let records = (1..=15).map(record).collect::<Vec<_>>();
        let text = render_preview(&records);
        assert_eq!(entry_count(&text), 10);
        assert!(text.contains("10. URL: https://site10.test"));
        assert!(!text.contains("site11"));
        assert_eq!(
            text.lines().last(),
            Some("... and 5 more records.")
        );
    }

    #[test]
    fn short_lists_have_no_remainder_line() {
        let records = (1..=3).map(record).collect::<Vec<_>>();
        let text = render_preview(&records);
        assert_eq!(entry_count(&text), 3);
        assert!(!text.contains("more records"));
    }

    #[test]
    fn empty_fields_render_placeholders() {
        let mut sparse = record(1);
        sparse.title.clear();
        sparse.list.clear();
        sparse.tags.clear();
        let text = render_preview(&[sparse]);
        assert!(text.contains("   Title: N/A\n"));
        assert!(text.contains("   Description: N/A\n"));
        assert!(text.contains("   Tags: \n"));
        assert!(text.contains("   List: N/A\n"));
    }

    #[test]
    fn tags_are_comma_joined() {
        let text = render_preview(&[record(1)]);
        assert!(text.contains("   Tags: a, b\n"));
    }

    #[test]
    fn empty_input_and_custom_limit() {
        assert!(render_preview(&[]).contains("(no records)"));
        let records = (1..=4).map(record).collect::<Vec<_>>();
        let text = render_preview_with_limit(&records, 2);
        assert_eq!(entry_count(&text), 2);
        assert!(text.contains("... and 2 more records."));
    }
}
