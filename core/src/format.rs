use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::path::Path;

lazy_static! {
    static ref URL_RE: Regex = Regex::new(r#"https?://[^\s<>"'()\[\]]+"#).expect("valid regex");
    static ref SEL_TITLE: Selector = Selector::parse("title").expect("valid selector");
    static ref SEL_H1: Selector = Selector::parse("h1").expect("valid selector");
    static ref SEL_BODY: Selector = Selector::parse("body").expect("valid selector");
    static ref SEL_LINK: Selector = Selector::parse("a[href]").expect("valid selector");
}

/// Number of leading non-empty lines searched for a `URL:` header.
const HEADER_LINES: usize = 5;

/// The closed set of source formats the store understands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    #[default]
    Text,
    Html,
    Json,
    JsonLines,
}

impl DocumentFormat {
    /// Pick a format from the file extension; `None` means the file is not part of the corpus.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" | "text" | "md" => Some(DocumentFormat::Text),
            "html" | "htm" => Some(DocumentFormat::Html),
            "json" => Some(DocumentFormat::Json),
            "jsonl" | "ndjson" => Some(DocumentFormat::JsonLines),
            _ => None,
        }
    }
}

/// A document as handed to the store, before it gets an id and tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewDocument {
    pub title: String,
    pub url: String,
    pub content: String,
    /// Outbound references (absolute or corpus-relative URLs).
    pub links: Vec<String>,
    pub format: DocumentFormat,
}

impl NewDocument {
    pub fn new(title: impl Into<String>, url: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let links = extract_urls(&content);
        Self { title: title.into(), url: url.into(), content, links, format: DocumentFormat::Text }
    }

    pub fn with_links<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.links = links.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && self.content.trim().is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct InputDoc {
    #[serde(default)]
    id: Option<String>,
    title: String,
    body: String,
    #[serde(default)]
    url: Option<String>,
}

/// Where a file sits in the corpus; used to derive a url when the file does not declare one.
pub(crate) struct ParseContext<'a> {
    pub rel_path: &'a str,
    pub stem: &'a str,
    pub base_url: Option<&'a str>,
}

impl ParseContext<'_> {
    fn default_url(&self, key: Option<&str>) -> String {
        match (self.base_url, key) {
            (Some(base), key) => format!("{}/{}", base.trim_end_matches('/'), key.unwrap_or(self.stem)),
            (None, Some(key)) => format!("{}#{}", self.rel_path, key),
            (None, None) => self.rel_path.to_string(),
        }
    }
}

/// Records parsed out of one file. The outer error rejects the whole file,
/// inner errors reject a single record (one JSON array element or line).
pub(crate) type ParsedFile = Result<Vec<Result<NewDocument, String>>, String>;

pub(crate) fn parse(format: DocumentFormat, raw: &str, ctx: &ParseContext<'_>) -> ParsedFile {
    match format {
        DocumentFormat::Text => Ok(vec![Ok(parse_text(raw, ctx))]),
        DocumentFormat::Html => Ok(vec![Ok(parse_html(raw, ctx))]),
        DocumentFormat::Json => parse_json(raw, ctx),
        DocumentFormat::JsonLines => Ok(parse_json_lines(raw, ctx)),
    }
}

fn parse_text(raw: &str, ctx: &ParseContext<'_>) -> NewDocument {
    let header = split_header(raw, None);
    let links = extract_urls(&header.content);
    NewDocument {
        title: header.title,
        url: header.url.unwrap_or_else(|| ctx.default_url(None)),
        content: header.content,
        links,
        format: DocumentFormat::Text,
    }
}

fn parse_html(raw: &str, ctx: &ParseContext<'_>) -> NewDocument {
    let doc = Html::parse_document(raw);
    let title = doc
        .select(&SEL_TITLE)
        .chain(doc.select(&SEL_H1))
        .map(|n| collapse_whitespace(&n.text().collect::<String>()))
        .find(|t| !t.is_empty());
    let text = doc.select(&SEL_BODY).next().map(visible_text).unwrap_or_default();
    let links = doc
        .select(&SEL_LINK)
        .filter_map(|a| a.value().attr("href"))
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty() && !h.starts_with('#'))
        .collect();
    let header = split_header(&text, title);
    NewDocument {
        title: header.title,
        url: header.url.unwrap_or_else(|| ctx.default_url(None)),
        content: header.content,
        links,
        format: DocumentFormat::Html,
    }
}

fn parse_json(raw: &str, ctx: &ParseContext<'_>) -> ParsedFile {
    let json: serde_json::Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    match json {
        serde_json::Value::Array(arr) => Ok(arr
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                serde_json::from_value::<InputDoc>(v)
                    .map(|d| from_input(d, DocumentFormat::Json, ctx))
                    .map_err(|e| format!("element {i}: {e}"))
            })
            .collect()),
        serde_json::Value::Object(_) => {
            let doc: InputDoc = serde_json::from_value(json).map_err(|e| e.to_string())?;
            Ok(vec![Ok(from_input(doc, DocumentFormat::Json, ctx))])
        }
        _ => Err("expected a JSON object or array of objects".into()),
    }
}

fn parse_json_lines(raw: &str, ctx: &ParseContext<'_>) -> Vec<Result<NewDocument, String>> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<InputDoc>(line)
                .map(|d| from_input(d, DocumentFormat::JsonLines, ctx))
                .map_err(|e| format!("line {}: {e}", i + 1))
        })
        .collect()
}

fn from_input(doc: InputDoc, format: DocumentFormat, ctx: &ParseContext<'_>) -> NewDocument {
    let url = doc
        .url
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| ctx.default_url(doc.id.as_deref()));
    let links = extract_urls(&doc.body);
    NewDocument { title: doc.title.trim().to_string(), url, content: doc.body, links, format }
}

struct Header {
    title: String,
    url: Option<String>,
    content: String,
}

/// Pull the title and `URL:` line off the top of a plain text body.
///
/// When `title` is already known (HTML `<title>`), a leading line repeating it is dropped
/// instead of being promoted to title.
fn split_header(text: &str, title: Option<String>) -> Header {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let mut skip = vec![false; lines.len()];
    let mut url = None;
    let mut found_title = title;
    let mut title_line_seen = false;

    for (i, line) in lines.iter().enumerate().filter(|(_, l)| !l.is_empty()).take(HEADER_LINES) {
        if url.is_none() && line.get(..4).map_or(false, |p| p.eq_ignore_ascii_case("url:")) {
            let value = line[4..].trim();
            if !value.is_empty() {
                url = Some(value.to_string());
            }
            skip[i] = true;
            continue;
        }
        if title_line_seen {
            continue;
        }
        match &found_title {
            None => {
                found_title = Some(line.to_string());
                skip[i] = true;
                title_line_seen = true;
            }
            Some(t) if collapse_whitespace(line) == *t => {
                skip[i] = true;
                title_line_seen = true;
            }
            Some(_) => {}
        }
    }

    let content = lines
        .iter()
        .zip(skip)
        .filter(|(_, s)| !s)
        .map(|(l, _)| *l)
        .collect::<Vec<_>>()
        .join("\n");
    Header { title: found_title.unwrap_or_default(), url, content: content.trim().to_string() }
}

/// Text nodes under `root`, skipping script and style subtrees. Block-level elements start a
/// new line so words in adjacent blocks stay apart.
fn visible_text(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in root.descendants() {
        if let Some(el) = node.value().as_element() {
            if is_block(el.name()) {
                break_line(&mut out);
            }
            continue;
        }
        let Some(text) = node.value().as_text() else { continue };
        let hidden = node.ancestors().any(|a| {
            a.value().as_element().map_or(false, |e| matches!(e.name(), "script" | "style"))
        });
        if hidden {
            continue;
        }
        let after_block = node
            .prev_sibling()
            .and_then(|p| p.value().as_element().map(|e| is_block(e.name())))
            .unwrap_or(false);
        if after_block {
            break_line(&mut out);
        }
        out.push_str(text);
    }
    out
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "address" | "article" | "aside" | "blockquote" | "br" | "dd" | "div" | "dl" | "dt" | "figcaption"
            | "figure" | "footer" | "form" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "header" | "hr"
            | "li" | "main" | "nav" | "ol" | "p" | "pre" | "section" | "table" | "td" | "th" | "tr" | "ul"
    )
}

fn break_line(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_urls(text: &str) -> Vec<String> {
    URL_RE
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(|c| matches!(c, '.' | ',' | ';' | ':' | '!' | '?')).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ParseContext<'static> {
        ParseContext { rel_path: "notes/doc_01.txt", stem: "doc_01", base_url: None }
    }

    #[test]
    fn text_header_is_split_off() {
        let raw = "Introduction to Tries\n\nURL: https://cs.example.com/tries\n\nTries store strings.\nSee https://cs.example.com/graphs.\n";
        let doc = parse_text(raw, &ctx());
        assert_eq!(doc.title, "Introduction to Tries");
        assert_eq!(doc.url, "https://cs.example.com/tries");
        assert_eq!(doc.content, "Tries store strings.\nSee https://cs.example.com/graphs.");
        assert_eq!(doc.links, vec!["https://cs.example.com/graphs"]);
    }

    #[test]
    fn text_without_url_gets_default() {
        let doc = parse_text("Title\nbody", &ctx());
        assert_eq!(doc.url, "notes/doc_01.txt");
        let with_base = ParseContext { base_url: Some("https://docs.local/"), ..ctx() };
        assert_eq!(parse_text("Title\nbody", &with_base).url, "https://docs.local/doc_01");
    }

    #[test]
    fn html_title_body_and_links() {
        let raw = "<!DOCTYPE html>\n<html>\n<head><title>B+ Trees</title><style>p { color: red }</style></head>\n<body>\n<h1>B+ Trees</h1>\n<p>URL: <a href='https://cs.example.com/bplus'>https://cs.example.com/bplus</a></p>\n<p>Used in <a href=\"https://cs.example.com/db\">databases</a>.</p>\n<script>var hidden = 1;</script>\n</body>\n</html>";
        let doc = parse_html(raw, &ctx());
        assert_eq!(doc.title, "B+ Trees");
        assert_eq!(doc.url, "https://cs.example.com/bplus");
        assert_eq!(doc.content, "Used in databases.");
        assert!(doc.links.contains(&"https://cs.example.com/db".to_string()));
        assert_eq!(doc.format, DocumentFormat::Html);
    }

    #[test]
    fn minified_html_keeps_block_words_apart() {
        let raw = "<html><head><title>Lists</title></head><body><ul><li>merge</li><li>sort</li></ul><p>alpha</p><p>beta<br>gamma <em>delta</em></p>tail</body></html>";
        let doc = parse_html(raw, &ctx());
        assert_eq!(doc.content, "merge\nsort\nalpha\nbeta\ngamma delta\ntail");
        assert_eq!(crate::tokenizer::tokenize(&doc.content), vec!["merge", "sort", "alpha", "beta", "gamma", "delta", "tail"]);
    }

    #[test]
    fn json_lines_reject_single_records() {
        let raw = "{\"id\":\"a\",\"title\":\"A\",\"body\":\"alpha\"}\n\nnot json\n{\"title\":\"B\",\"body\":\"beta\",\"url\":\"https://b\"}\n";
        let records = parse_json_lines(raw, &ctx());
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].as_ref().unwrap().url, "notes/doc_01.txt#a");
        assert!(records[1].as_ref().unwrap_err().starts_with("line 3"));
        assert_eq!(records[2].as_ref().unwrap().url, "https://b");
    }

    #[test]
    fn json_scalar_rejects_file() {
        assert!(parse(DocumentFormat::Json, "42", &ctx()).is_err());
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("a/b.HTML")), Some(DocumentFormat::Html));
        assert_eq!(DocumentFormat::from_path(Path::new("a/b.jsonl")), Some(DocumentFormat::JsonLines));
        assert_eq!(DocumentFormat::from_path(Path::new("a/b.png")), None);
        assert_eq!(DocumentFormat::from_path(Path::new("README")), None);
    }
}
