use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::ImportError;
use crate::record::{RawRecord, RawValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Json,
    Html,
    Text,
    Markdown,
}

impl SourceFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Html => "html",
            Self::Text => "text",
            Self::Markdown => "markdown",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Html => "html",
            Self::Text => "txt",
            Self::Markdown => "md",
        }
    }

    /// Parse an explicit format name, e.g. from `--format`.
    pub fn parse(value: &str) -> Result<Self, ImportError> {
        let value = value.trim().trim_start_matches('.');
        for format in [
            Self::Csv,
            Self::Json,
            Self::Html,
            Self::Text,
            Self::Markdown,
        ] {
            if value.eq_ignore_ascii_case(format.as_str())
                || value.eq_ignore_ascii_case(format.extension())
            {
                return Ok(format);
            }
        }
        Err(ImportError::UnsupportedFormat(value.to_ascii_lowercase()))
    }
}

pub trait Extractor: Sync {
    fn format(&self) -> SourceFormat;

    /// Turn decoded file content into raw records. Structural errors fail the
    /// whole input; nothing is emitted partially.
    fn extract(&self, content: &str) -> Result<Vec<RawRecord>, ImportError>;
}

pub struct CsvExtractor;
pub struct JsonExtractor;
pub struct HtmlExtractor;
pub struct TextExtractor;
pub struct MarkdownExtractor;

static EXTRACTORS: [(&str, &dyn Extractor); 5] = [
    ("csv", &CsvExtractor),
    ("json", &JsonExtractor),
    ("html", &HtmlExtractor),
    ("txt", &TextExtractor),
    ("md", &MarkdownExtractor),
];

static HREF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="([^"]+)""#).expect("valid href pattern"));

static MARKDOWN_LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]*)\]\(([^)\s]*)\)").expect("valid markdown link pattern")
});

/// Registered `(extension, format)` pairs in dispatch order.
pub fn supported_formats() -> Vec<(&'static str, SourceFormat)> {
    EXTRACTORS
        .iter()
        .map(|(extension, extractor)| (*extension, extractor.format()))
        .collect()
}

/// Pick an extractor from the file extension, compared case-insensitively.
pub fn select_extractor(path: &Path) -> Result<&'static dyn Extractor, ImportError> {
    let extension = path
        .extension()
        .map(|value| value.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    EXTRACTORS
        .iter()
        .find(|(candidate, _)| *candidate == extension)
        .map(|(_, extractor)| *extractor)
        .ok_or(ImportError::UnsupportedFormat(extension))
}

/// Like [`select_extractor`], but an explicit format wins over the extension.
pub fn resolve_extractor(
    path: &Path,
    explicit: Option<SourceFormat>,
) -> Result<&'static dyn Extractor, ImportError> {
    let Some(format) = explicit else {
        return select_extractor(path);
    };
    EXTRACTORS
        .iter()
        .find(|(_, extractor)| extractor.format() == format)
        .map(|(_, extractor)| *extractor)
        .ok_or_else(|| ImportError::UnsupportedFormat(format.extension().to_string()))
}

impl Extractor for CsvExtractor {
    fn format(&self) -> SourceFormat {
        SourceFormat::Csv
    }

    fn extract(&self, content: &str) -> Result<Vec<RawRecord>, ImportError> {
        let rows = parse_csv_rows(strip_bom(content), ',')?;
        let Some((header, body)) = rows.split_first() else {
            return Ok(Vec::new());
        };
        let headers = header
            .iter()
            .map(|value| value.trim().to_string())
            .collect::<Vec<_>>();

        let mut records = Vec::new();
        for row in body {
            if row.iter().all(|value| value.trim().is_empty()) {
                continue;
            }
            let mut record = RawRecord::default();
            for (index, header) in headers.iter().enumerate() {
                if let Some(value) = row.get(index) {
                    record.set(header, RawValue::text(value.clone()));
                }
            }
            records.push(record);
        }
        Ok(records)
    }
}

impl Extractor for JsonExtractor {
    fn format(&self) -> SourceFormat {
        SourceFormat::Json
    }

    fn extract(&self, content: &str) -> Result<Vec<RawRecord>, ImportError> {
        let trimmed = strip_bom(content).trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        let parsed: Value = serde_json::from_str(trimmed)
            .map_err(|error| ImportError::malformed("json", error.to_string()))?;
        match &parsed {
            Value::Array(items) => Ok(items.iter().map(json_record).collect()),
            Value::Object(_) => Ok(vec![json_record(&parsed)]),
            other => Err(ImportError::SchemaMismatch(format!(
                "expected a JSON array or object, found {}",
                json_kind(other)
            ))),
        }
    }
}

impl Extractor for HtmlExtractor {
    fn format(&self) -> SourceFormat {
        SourceFormat::Html
    }

    fn extract(&self, content: &str) -> Result<Vec<RawRecord>, ImportError> {
        Ok(HREF_PATTERN
            .captures_iter(strip_bom(content))
            .map(|captures| RawRecord::with_url(&captures[1]))
            .collect())
    }
}

impl Extractor for TextExtractor {
    fn format(&self) -> SourceFormat {
        SourceFormat::Text
    }

    fn extract(&self, content: &str) -> Result<Vec<RawRecord>, ImportError> {
        Ok(strip_bom(content)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(RawRecord::with_url)
            .collect())
    }
}

impl Extractor for MarkdownExtractor {
    fn format(&self) -> SourceFormat {
        SourceFormat::Markdown
    }

    fn extract(&self, content: &str) -> Result<Vec<RawRecord>, ImportError> {
        Ok(MARKDOWN_LINK_PATTERN
            .captures_iter(strip_bom(content))
            .map(|captures| RawRecord::with_link(&captures[1], &captures[2]))
            .collect())
    }
}

fn json_record(value: &Value) -> RawRecord {
    let mut record = RawRecord::default();
    if let Some(object) = value.as_object() {
        for (key, value) in object {
            record.set(key, RawValue::from_json(value));
        }
    }
    record
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn parse_csv_rows(content: &str, delimiter: char) -> Result<Vec<Vec<String>>, ImportError> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(ch);
            }
            continue;
        }

        match ch {
            '"' if field.is_empty() => in_quotes = true,
            '\n' | '\r' => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ if ch == delimiter => row.push(std::mem::take(&mut field)),
            _ => field.push(ch),
        }
    }

    if in_quotes {
        return Err(ImportError::malformed(
            "csv",
            format!("unterminated quoted field on row {}", rows.len() + 1),
        ));
    }

    row.push(field);
    if row.len() > 1 || row.first().is_some_and(|value| !value.trim().is_empty()) {
        rows.push(row);
    }
    Ok(rows)
}

fn strip_bom(content: &str) -> &str {
    content.strip_prefix('\u{feff}').unwrap_or(content)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{
        CsvExtractor, Extractor, HtmlExtractor, JsonExtractor, MarkdownExtractor, SourceFormat,
        TextExtractor, resolve_extractor, select_extractor, supported_formats,
    };
    use crate::error::ImportError;
    use crate::record::{RawRecord, RawValue};

    #[test]
    fn select_extractor_maps_every_supported_extension() {
        let cases = [
            ("bookmarks.csv", SourceFormat::Csv),
            ("bookmarks.json", SourceFormat::Json),
            ("export.html", SourceFormat::Html),
            ("urls.txt", SourceFormat::Text),
            ("notes.md", SourceFormat::Markdown),
            ("UPPER.CSV", SourceFormat::Csv),
            ("Mixed.Md", SourceFormat::Markdown),
            ("/tmp/nested.dir/links.TXT", SourceFormat::Text),
        ];
        for (path, expected) in cases {
            let extractor = select_extractor(Path::new(path)).expect("supported");
            assert_eq!(extractor.format(), expected, "{path}");
        }
    }

    #[test]
    fn select_extractor_rejects_unknown_extensions() {
        for (path, extension) in [
            ("bookmarks.xlsx", "xlsx"),
            ("page.htm", "htm"),
            ("README", ""),
            ("archive.csv.gz", "gz"),
        ] {
            match select_extractor(Path::new(path)) {
                Err(ImportError::UnsupportedFormat(found)) => assert_eq!(found, extension),
                other => panic!("expected UnsupportedFormat for {path}, got {:?}", other.err()),
            }
        }
    }

    #[test]
    fn explicit_format_overrides_extension() {
        let extractor =
            resolve_extractor(Path::new("links.dat"), Some(SourceFormat::Text)).expect("explicit");
        assert_eq!(extractor.format(), SourceFormat::Text);
        assert!(resolve_extractor(Path::new("links.dat"), None).is_err());
    }

    #[test]
    fn source_format_parse_accepts_names_and_extensions() {
        assert_eq!(SourceFormat::parse("CSV").expect("csv"), SourceFormat::Csv);
        assert_eq!(SourceFormat::parse(".md").expect("md"), SourceFormat::Markdown);
        assert_eq!(
            SourceFormat::parse("markdown").expect("markdown"),
            SourceFormat::Markdown
        );
        assert_eq!(SourceFormat::parse("txt").expect("txt"), SourceFormat::Text);
        assert!(SourceFormat::parse("yaml").is_err());
    }

    #[test]
    fn supported_formats_lists_table_in_order() {
        let extensions = supported_formats()
            .into_iter()
            .map(|(extension, _)| extension)
            .collect::<Vec<_>>();
        assert_eq!(extensions, vec!["csv", "json", "html", "txt", "md"]);
    }

    #[test]
    fn csv_maps_header_columns() {
        let records = CsvExtractor
            .extract("url,title\nhttp://example.com,Example\n")
            .expect("csv");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].url_text(), "http://example.com");
        assert_eq!(records[0].title_text(), "Example");
        assert!(records[0].description.is_none());
    }

    #[test]
    fn csv_header_only_is_empty() {
        assert!(CsvExtractor.extract("url,title\n").expect("csv").is_empty());
        assert!(CsvExtractor.extract("").expect("csv").is_empty());
    }

    #[test]
    fn csv_supports_quotes_bom_and_crlf() {
        let records = CsvExtractor
            .extract("\u{feff} url ,description\r\nhttp://a.com,\"line 1\nline, 2\"\r\n\"http://b.com\",\"has \"\"quotes\"\"\"\r\n,\r\n")
            .expect("csv");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].url_text(), "http://a.com");
        assert_eq!(records[0].description_text(), "line 1\nline, 2");
        assert_eq!(records[1].url_text(), "http://b.com");
        assert_eq!(records[1].description_text(), "has \"quotes\"");
    }

    #[test]
    fn csv_short_rows_leave_fields_absent() {
        let records = CsvExtractor
            .extract("url,title,tags\nhttp://a.com")
            .expect("csv");
        assert_eq!(records.len(), 1);
        assert!(records[0].title.is_none());
        assert_eq!(records[0].tags, None);
    }

    #[test]
    fn csv_keeps_quotes_inside_unquoted_fields() {
        let records = CsvExtractor
            .extract("url,title\nhttp://a.com,27\" Monitor\nhttp://b.com,He said \"hi\"\n")
            .expect("csv");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].url_text(), "http://a.com");
        assert_eq!(records[0].title_text(), "27\" Monitor");
        assert_eq!(records[1].url_text(), "http://b.com");
        assert_eq!(records[1].title_text(), "He said \"hi\"");
    }

    #[test]
    fn csv_unterminated_quote_is_malformed() {
        let error = CsvExtractor
            .extract("url,title\nhttp://a.com,\"open")
            .expect_err("must fail");
        assert!(matches!(
            error,
            ImportError::MalformedInput { format: "csv", .. }
        ));
    }

    #[test]
    fn json_array_maps_canonical_keys() {
        let records = JsonExtractor
            .extract(
                r#"[{"url":"http://a.com","title":"A","tags":["x","y"],"folder":"f"},{"url":null},7]"#,
            )
            .expect("json");
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].url_text(), "http://a.com");
        assert_eq!(records[0].tag_list(), vec!["x".to_string(), "y".to_string()]);
        assert_eq!(records[1].url, Some(RawValue::Null));
        assert_eq!(records[2], RawRecord::default());
    }

    #[test]
    fn json_single_object_is_one_record() {
        let records = JsonExtractor
            .extract(r#"{"url":"http://a.com","title":"A"}"#)
            .expect("json");
        assert_eq!(records, vec![RawRecord::with_link("A", "http://a.com")]);
    }

    #[test]
    fn json_scalar_is_schema_mismatch() {
        let error = JsonExtractor.extract("\"http://a.com\"").expect_err("must fail");
        assert!(matches!(error, ImportError::SchemaMismatch(_)));
    }

    #[test]
    fn json_syntax_error_is_malformed() {
        let error = JsonExtractor
            .extract(r#"[{"url": "http://a.com"},"#)
            .expect_err("must fail");
        assert!(matches!(
            error,
            ImportError::MalformedInput { format: "json", .. }
        ));
        assert!(JsonExtractor.extract("  \n").expect("blank").is_empty());
    }

    #[test]
    fn html_collects_every_href() {
        let records = HtmlExtractor
            .extract(
                r#"<DL><DT><A HREF="ignored">x</A><a href="http://a.com">A</a>
<a class="x" href="http://b.com">B</a><a href="http://a.com">again</a><a href="">empty</a>"#,
            )
            .expect("html");
        let urls = records
            .iter()
            .map(RawRecord::url_text)
            .collect::<Vec<_>>();
        assert_eq!(urls, vec!["http://a.com", "http://b.com", "http://a.com"]);
        assert!(records.iter().all(|record| record.title.is_none()));
    }

    #[test]
    fn text_skips_blank_lines_and_trims() {
        let records = TextExtractor
            .extract("  http://a.com  \n\n\thttp://b.com\n   \nhttp://c.com")
            .expect("text");
        let urls = records
            .iter()
            .map(RawRecord::url_text)
            .collect::<Vec<_>>();
        assert_eq!(urls, vec!["http://a.com", "http://b.com", "http://c.com"]);
    }

    #[test]
    fn markdown_matches_inline_links() {
        let records = MarkdownExtractor
            .extract("See [Example](http://example.com) here")
            .expect("markdown");
        assert_eq!(
            records,
            vec![RawRecord::with_link("Example", "http://example.com")]
        );
    }

    #[test]
    fn markdown_ignores_reference_links() {
        let records = MarkdownExtractor
            .extract("- [One](https://one.test)\n- [Ref][1]\n\n[1]: https://ref.test\n- [Two](https://two.test)")
            .expect("markdown");
        let titles = records
            .iter()
            .map(RawRecord::title_text)
            .collect::<Vec<_>>();
        assert_eq!(titles, vec!["One", "Two"]);
    }
}
