// src/ingest/feed.rs
//! RSS 2.0 / RSS 1.0 / Atom parsing into `Entry` values, preserving feed order.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::FeedError;
use crate::ingest::types::Entry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeedKind {
    Rss,
    // RSS 1.0: items sit next to the channel under <rdf:RDF>
    Rdf,
    Atom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Summary,
    Content,
    Published,
    Updated,
}

impl FeedKind {
    fn from_root(local: &[u8]) -> Result<Self, FeedError> {
        match local {
            b"rss" => Ok(FeedKind::Rss),
            b"RDF" => Ok(FeedKind::Rdf),
            b"feed" => Ok(FeedKind::Atom),
            other => Err(FeedError::parse(format!(
                "unsupported root element <{}>",
                String::from_utf8_lossy(other)
            ))),
        }
    }

    fn item_tag(self) -> &'static [u8] {
        match self {
            FeedKind::Atom => b"entry",
            FeedKind::Rss | FeedKind::Rdf => b"item",
        }
    }

    /// Matches the qualified name, so `<media:title>` or `<dc:description>`
    /// never stand in for the item's own fields.
    fn field(self, qname: &[u8]) -> Option<Field> {
        match (self, qname) {
            (_, b"title") => Some(Field::Title),
            (FeedKind::Atom, b"summary") => Some(Field::Summary),
            (FeedKind::Atom, b"content") => Some(Field::Content),
            (FeedKind::Atom, b"published") => Some(Field::Published),
            (FeedKind::Atom, b"updated") => Some(Field::Updated),
            (_, b"description") => Some(Field::Summary),
            (_, b"pubDate") => Some(Field::Published),
            (_, b"dc:date") => Some(Field::Updated),
            _ => None,
        }
    }
}

/// Item fields as they appear in the document; the first occurrence wins.
#[derive(Debug, Default)]
struct RawItem {
    title: Option<String>,
    summary: Option<String>,
    content: Option<String>,
    published: Option<String>,
    updated: Option<String>,
}

impl RawItem {
    fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Summary => &mut self.summary,
            Field::Content => &mut self.content,
            Field::Published => &mut self.published,
            Field::Updated => &mut self.updated,
        };
        if slot.is_none() {
            *slot = Some(value.trim().to_string());
        }
    }

    fn into_entry(self) -> Result<Entry, FeedError> {
        let title = self.title.unwrap_or_default();
        let published_at = self
            .published
            .as_deref()
            .and_then(parse_timestamp)
            .or_else(|| self.updated.as_deref().and_then(parse_timestamp))
            .ok_or_else(|| FeedError::parse(format!("item {title:?} has no readable timestamp")))?;

        Ok(Entry {
            title,
            summary: self.summary.or(self.content).unwrap_or_default(),
            published_at,
        })
    }
}

/// Parse a feed document. Any item without a readable publish time fails the
/// whole document, the same way a malformed body does.
pub fn parse_feed(xml: &str) -> Result<Vec<Entry>, FeedError> {
    let xml_clean = scrub_html_entities_for_xml(xml);
    let mut reader = Reader::from_str(&xml_clean);

    let mut kind: Option<FeedKind> = None;
    let mut items = Vec::new();
    let mut item: Option<RawItem> = None;
    // element depth below the open item
    let mut depth = 0usize;
    let mut capture: Option<(Field, String)> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| FeedError::parse(format!("xml: {e}")))?;
        match event {
            Event::Start(e) => match (kind, item.is_some()) {
                (None, _) => kind = Some(FeedKind::from_root(e.local_name().as_ref())?),
                (Some(k), false) => {
                    if e.local_name().as_ref() == k.item_tag() {
                        item = Some(RawItem::default());
                        depth = 0;
                    }
                }
                (Some(k), true) => {
                    depth += 1;
                    match capture.as_mut() {
                        // nested markup (Atom xhtml): keep words apart
                        Some((_, text)) => text.push(' '),
                        None if depth == 1 => {
                            capture = k.field(e.name().as_ref()).map(|f| (f, String::new()));
                        }
                        None => {}
                    }
                }
            },
            Event::Empty(e) => {
                if kind.is_none() {
                    kind = Some(FeedKind::from_root(e.local_name().as_ref())?);
                } else if let Some((_, text)) = capture.as_mut() {
                    text.push(' ');
                }
            }
            Event::Text(t) => {
                if let Some((_, text)) = capture.as_mut() {
                    let raw = t
                        .unescape()
                        .map_err(|e| FeedError::parse(format!("xml: {e}")))?;
                    text.push_str(&raw);
                }
            }
            Event::CData(c) => {
                if let Some((_, text)) = capture.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(_) if depth == 0 => {
                if let Some(done) = item.take() {
                    items.push(done);
                }
            }
            Event::End(_) => {
                if depth == 1 {
                    if let (Some((field, text)), Some(open)) = (capture.take(), item.as_mut()) {
                        open.set(field, text);
                    }
                }
                depth -= 1;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if kind.is_none() {
        return Err(FeedError::parse("empty document"));
    }
    items.into_iter().map(RawItem::into_entry).collect()
}

/// RFC 2822 (RSS) or RFC 3339 (Atom, Dublin Core) → naive UTC, whole seconds.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc).trunc_subsecs(0).naive_utc())
}

// Status pages routinely emit HTML entities that XML does not define.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&hellip;", "...")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
