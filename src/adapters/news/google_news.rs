//! Google News RSS adapter.
//!
//! Queries the public search feed and parses RSS 2.0 `<item>`s, falling back to
//! Atom `<entry>`s for locales that serve Atom.

use crate::domain::{DomainError, HeadlineItem};
use crate::ports::NewsPort;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

const GOOGLE_NEWS_RSS_URL: &str = "https://news.google.com/rss/search";

/// Locale and transport settings for the feed.
#[derive(Debug, Clone)]
pub struct NewsFeedSettings {
    /// `hl` parameter, e.g. "en-US".
    pub language: String,
    /// `gl` parameter, e.g. "US".
    pub region: String,
    /// `ceid` parameter, e.g. "US:en".
    pub edition: String,
    pub timeout: Duration,
}

impl Default for NewsFeedSettings {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            region: "US".to_string(),
            edition: "US:en".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Google News RSS search adapter.
pub struct GoogleNewsRss {
    client: reqwest::Client,
    settings: NewsFeedSettings,
}

impl GoogleNewsRss {
    pub fn new(settings: NewsFeedSettings) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| DomainError::Config(format!("HTTP client build failed: {}", e)))?;
        Ok(Self { client, settings })
    }

    /// `"SYM"` or `"SYM" OR "Company Name"`.
    pub fn build_query(symbol: &str, company: Option<&str>) -> String {
        let mut terms = vec![format!("\"{}\"", symbol)];
        if let Some(c) = company.map(str::trim).filter(|c| !c.is_empty()) {
            terms.push(format!("\"{}\"", c));
        }
        terms.join(" OR ")
    }

    async fn fetch(&self, query: &str) -> Result<String, DomainError> {
        let response = self
            .client
            .get(GOOGLE_NEWS_RSS_URL)
            .query(&[
                ("q", query),
                ("hl", self.settings.language.as_str()),
                ("gl", self.settings.region.as_str()),
                ("ceid", self.settings.edition.as_str()),
            ])
            .send()
            .await
            .map_err(|e| DomainError::News(format!("request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| DomainError::News(format!("bad status: {}", e)))?;

        response
            .text()
            .await
            .map_err(|e| DomainError::News(format!("read body: {}", e)))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    RssItem,
    AtomEntry,
}

#[derive(Clone, Copy)]
enum Field {
    Title,
    Link,
}

struct Pending {
    kind: EntryKind,
    title: String,
    link: String,
}

/// Parse an RSS 2.0 or Atom document into headlines.
///
/// Items missing a title or link are skipped, titles are de-duplicated, and at most
/// `max_results` items are returned. RSS items win; Atom entries are used only when
/// the document has no usable RSS items.
pub fn parse_feed(xml: &str, max_results: usize) -> Result<Vec<HeadlineItem>, DomainError> {
    let mut reader = Reader::from_str(xml);
    let mut rss = Vec::new();
    let mut atom = Vec::new();
    let mut current: Option<Pending> = None;
    let mut field: Option<Field> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| DomainError::News(format!("XML parse error: {}", e)))?;
        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"item" => current = Some(Pending::new(EntryKind::RssItem)),
                b"entry" => current = Some(Pending::new(EntryKind::AtomEntry)),
                b"title" if current.is_some() => field = Some(Field::Title),
                b"link" => {
                    if let Some(p) = current.as_mut() {
                        if p.kind == EntryKind::AtomEntry {
                            take_href(&e, p)?;
                        }
                        field = Some(Field::Link);
                    }
                }
                _ => {}
            },
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"link" {
                    if let Some(p) = current.as_mut() {
                        take_href(&e, p)?;
                    }
                }
            }
            Event::Text(t) => {
                if let (Some(f), Some(p)) = (field, current.as_mut()) {
                    p.push(f, &text_or_raw(&t));
                }
            }
            Event::CData(t) => {
                if let (Some(f), Some(p)) = (field, current.as_mut()) {
                    p.push(f, &String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"title" | b"link" => field = None,
                b"item" | b"entry" => {
                    field = None;
                    if let Some(p) = current.take() {
                        match p.kind {
                            EntryKind::RssItem => rss.push(p),
                            EntryKind::AtomEntry => atom.push(p),
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    let mut items = collect(rss, max_results);
    if items.is_empty() {
        items = collect(atom, max_results);
    }
    Ok(items)
}

/// Unescaped text. Feeds often carry HTML entities that XML does not define; an
/// unresolvable one keeps the raw text for this node only.
fn text_or_raw(t: &BytesText<'_>) -> String {
    match t.unescape_with(resolve_entity) {
        Ok(text) => text.into_owned(),
        Err(e) => {
            debug!(error = %e, "unresolved entity in feed text; keeping raw text");
            String::from_utf8_lossy(t).into_owned()
        }
    }
}

fn resolve_entity(name: &str) -> Option<&'static str> {
    match name {
        "amp" => Some("&"),
        "lt" => Some("<"),
        "gt" => Some(">"),
        "quot" => Some("\""),
        "apos" => Some("'"),
        "nbsp" => Some("\u{a0}"),
        "ndash" => Some("\u{2013}"),
        "mdash" => Some("\u{2014}"),
        "lsquo" => Some("\u{2018}"),
        "rsquo" => Some("\u{2019}"),
        "ldquo" => Some("\u{201c}"),
        "rdquo" => Some("\u{201d}"),
        "hellip" => Some("\u{2026}"),
        _ => None,
    }
}

fn take_href(e: &BytesStart<'_>, p: &mut Pending) -> Result<(), DomainError> {
    let href = e
        .try_get_attribute("href")
        .map_err(|err| DomainError::News(format!("XML attribute error: {}", err)))?;
    if let Some(attr) = href {
        let value = attr
            .unescape_value_with(resolve_entity)
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
        if p.link.trim().is_empty() {
            p.link = value;
        }
    }
    Ok(())
}

fn collect(pending: Vec<Pending>, max_results: usize) -> Vec<HeadlineItem> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for p in pending {
        if out.len() >= max_results {
            break;
        }
        let title = p.title.trim();
        let link = p.link.trim();
        if title.is_empty() || link.is_empty() || !seen.insert(title.to_string()) {
            continue;
        }
        out.push(HeadlineItem::new(title, Some(link.to_string())));
    }
    out
}

impl Pending {
    fn new(kind: EntryKind) -> Self {
        Self {
            kind,
            title: String::new(),
            link: String::new(),
        }
    }

    fn push(&mut self, field: Field, text: &str) {
        match field {
            Field::Title => self.title.push_str(text),
            // Atom links carry the URL in `href`; only RSS links have text content.
            Field::Link if self.kind == EntryKind::RssItem => self.link.push_str(text),
            Field::Link => {}
        }
    }
}

#[async_trait::async_trait]
impl NewsPort for GoogleNewsRss {
    async fn get_news(
        &self,
        symbol: &str,
        company: Option<&str>,
        max_results: usize,
    ) -> Vec<HeadlineItem> {
        let query = Self::build_query(symbol, company);
        debug!(symbol, query = %query, "requesting Google News RSS");

        let body = match self.fetch(&query).await {
            Ok(body) => body,
            Err(e) => {
                warn!(symbol, error = %e, "failed to fetch RSS");
                return Vec::new();
            }
        };

        match parse_feed(&body, max_results) {
            Ok(items) => {
                info!(symbol, items = items.len(), "parsed news items");
                items
            }
            Err(e) => {
                warn!(symbol, error = %e, "failed to parse RSS XML");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
  <title>"ACME" - Google News</title>
  <item><title>Acme beats earnings &amp; raises guidance - Reuters</title><link>https://news.example/1</link></item>
  <item><title><![CDATA[Acme opens new plant]]></title><link>https://news.example/2</link></item>
  <item><title>Acme beats earnings &amp; raises guidance - Reuters</title><link>https://news.example/dup</link></item>
  <item><title>No link here</title></item>
  <item><title>Third story</title><link>https://news.example/3</link></item>
</channel></rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Feed title</title>
  <entry><title>Atom headline</title><link href="https://atom.example/1"/></entry>
  <entry><title>Atom without link</title></entry>
</feed>"#;

    #[test]
    fn test_parse_rss_items() {
        let items = parse_feed(RSS, 12).unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "Acme beats earnings & raises guidance - Reuters");
        assert_eq!(items[0].link.as_deref(), Some("https://news.example/1"));
        assert_eq!(items[1].title, "Acme opens new plant");
        assert_eq!(items[2].title, "Third story");
    }

    #[test]
    fn test_parse_rss_respects_max_results() {
        let items = parse_feed(RSS, 2).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_parse_atom_fallback() {
        let items = parse_feed(ATOM, 12).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Atom headline");
        assert_eq!(items[0].link.as_deref(), Some("https://atom.example/1"));
    }

    #[test]
    fn test_parse_html_entities_keep_the_feed() {
        let xml = r#"<rss><channel>
  <item><title>Acme&nbsp;rallies &mdash; again</title><link>https://news.example/1</link></item>
  <item><title>Acme &copy; story</title><link>https://news.example/2</link></item>
  <item><title>Plain story</title><link>https://news.example/3</link></item>
</channel></rss>"#;
        let items = parse_feed(xml, 12).unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "Acme\u{a0}rallies \u{2014} again");
        assert_eq!(items[1].title, "Acme &copy; story");
        assert_eq!(items[2].title, "Plain story");
    }

    #[test]
    fn test_parse_malformed_xml_is_error() {
        assert!(parse_feed("<rss><channel><item><title>x</wrong></item>", 12).is_err());
    }

    #[test]
    fn test_build_query() {
        assert_eq!(GoogleNewsRss::build_query("TSM", None), "\"TSM\"");
        assert_eq!(
            GoogleNewsRss::build_query("TSM", Some("Taiwan Semiconductor")),
            "\"TSM\" OR \"Taiwan Semiconductor\""
        );
        assert_eq!(GoogleNewsRss::build_query("TSM", Some("  ")), "\"TSM\"");
    }
}
