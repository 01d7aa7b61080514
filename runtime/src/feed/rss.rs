//! RSS 2.0 encoding and decoding of [`FeedDocument`].

use super::model::{Channel, FeedDocument, FeedEntry};
use crate::error::{FeedError, Result};
use crate::posting::guid_for_link;
use chrono::DateTime;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashSet;
use tracing::warn;

const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

// ── Encoding ────────────────────────────────────────────────────────────

/// Render the document as pretty-printed RSS 2.0.
pub fn to_rss(doc: &FeedDocument) -> Result<String> {
    let missing = doc.channel.missing_fields();
    if !missing.is_empty() {
        return Err(FeedError::Serialization(format!(
            "channel is missing required field(s): {}",
            missing.join(", ")
        )));
    }

    let ch = &doc.channel;
    let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);
    emit(&mut w, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    rss.push_attribute(("xmlns:dc", DC_NS));
    rss.push_attribute(("xmlns:atom", ATOM_NS));
    emit(&mut w, Event::Start(rss))?;
    emit(&mut w, Event::Start(BytesStart::new("channel")))?;

    text_element(&mut w, "title", &ch.title)?;
    text_element(&mut w, "link", &ch.link)?;
    text_element(&mut w, "description", &ch.description)?;
    if !ch.language.is_empty() {
        text_element(&mut w, "language", &ch.language)?;
    }
    if let Some(href) = &ch.self_link {
        let mut atom = BytesStart::new("atom:link");
        atom.push_attribute(("href", href.as_str()));
        atom.push_attribute(("rel", "self"));
        atom.push_attribute(("type", "application/rss+xml"));
        emit(&mut w, Event::Empty(atom))?;
    }
    if let Some(built) = ch.last_build_date {
        text_element(&mut w, "lastBuildDate", &built.to_rfc2822())?;
    }

    for entry in &doc.entries {
        write_item(&mut w, entry, ch)?;
    }

    emit(&mut w, Event::End(BytesEnd::new("channel")))?;
    emit(&mut w, Event::End(BytesEnd::new("rss")))?;

    let mut bytes = w.into_inner();
    bytes.push(b'\n');
    String::from_utf8(bytes).map_err(|e| FeedError::Serialization(e.to_string()))
}

fn write_item(w: &mut Writer<Vec<u8>>, entry: &FeedEntry, ch: &Channel) -> Result<()> {
    emit(w, Event::Start(BytesStart::new("item")))?;
    text_element(w, "title", &entry.title)?;
    text_element(w, "link", &entry.link)?;

    emit(w, Event::Start(BytesStart::new("description")))?;
    // An empty Text event keeps the end tag on the same line.
    if entry.description.is_empty() || entry.description.contains("]]>") {
        emit(w, Event::Text(BytesText::new(&entry.description)))?;
    } else {
        emit(w, Event::CData(BytesCData::new(entry.description.as_str())))?;
    }
    emit(w, Event::End(BytesEnd::new("description")))?;

    let mut guid = BytesStart::new("guid");
    guid.push_attribute(("isPermaLink", "false"));
    emit(w, Event::Start(guid))?;
    emit(w, Event::Text(BytesText::new(&entry.guid)))?;
    emit(w, Event::End(BytesEnd::new("guid")))?;

    if !entry.pub_date.is_empty() {
        text_element(w, "pubDate", &entry.pub_date)?;
    }
    if !entry.grade_label.is_empty() {
        text_element(w, "category", &entry.grade_label)?;
    }

    let mut source = BytesStart::new("source");
    source.push_attribute(("url", ch.link.as_str()));
    emit(w, Event::Start(source))?;
    emit(w, Event::Text(BytesText::new(&ch.title)))?;
    emit(w, Event::End(BytesEnd::new("source")))?;

    emit(w, Event::End(BytesEnd::new("item")))
}

fn text_element(w: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    emit(w, Event::Start(BytesStart::new(name)))?;
    emit(w, Event::Text(BytesText::new(text)))?;
    emit(w, Event::End(BytesEnd::new(name)))
}

fn emit(w: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    w.write_event(event)
        .map_err(|e| FeedError::Serialization(e.to_string()))
}

// ── Decoding ────────────────────────────────────────────────────────────

#[derive(Default)]
struct ItemDraft {
    title: String,
    link: String,
    description: String,
    guid: String,
    pub_date: String,
    category: String,
}

/// Parse an RSS 2.0 document previously written by [`to_rss`] or by
/// earlier releases of this tool.
pub fn from_rss(xml: &str) -> Result<FeedDocument> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut saw_rss = false;
    let mut saw_channel = false;
    let mut channel = Channel::default();
    let mut channel_pub_date: Option<String> = None;
    let mut item: Option<ItemDraft> = None;
    let mut entries: Vec<FeedEntry> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| {
            FeedError::Deserialization(format!("at byte {}: {e}", reader.buffer_position()))
        })?;

        match event {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                enter(&name, &path, &mut saw_rss, &mut saw_channel, &mut item)?;
                path.push(name);
                text.clear();
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                enter(&name, &path, &mut saw_rss, &mut saw_channel, &mut item)?;
                if name == "item" {
                    // <item/> has no link and is dropped
                    item = None;
                }
                if name == "atom:link" && parent_is(&path, "channel") && item.is_none() {
                    let mut href = None;
                    let mut is_self = false;
                    for attr in e.attributes().flatten() {
                        let value = attr
                            .unescape_value()
                            .map(|v| v.to_string())
                            .unwrap_or_default();
                        match attr.key.as_ref() {
                            b"href" => href = Some(value),
                            b"rel" => is_self = value == "self",
                            _ => {}
                        }
                    }
                    if is_self {
                        channel.self_link = href;
                    }
                }
            }
            Event::Text(e) => {
                let t = e
                    .unescape()
                    .map_err(|err| FeedError::Deserialization(err.to_string()))?;
                text.push_str(&t);
            }
            Event::CData(e) => {
                let t = std::str::from_utf8(&e)
                    .map_err(|err| FeedError::Deserialization(err.to_string()))?;
                text.push_str(t);
            }
            Event::End(_) => {
                let Some(name) = path.pop() else {
                    return Err(FeedError::Deserialization("unbalanced end tag".to_string()));
                };
                let value = std::mem::take(&mut text);

                if name == "item" && parent_is(&path, "channel") {
                    if let Some(draft) = item.take() {
                        push_entry(draft, &mut entries, &mut seen);
                    }
                } else if parent_is(&path, "item") {
                    if let Some(draft) = item.as_mut() {
                        match name.as_str() {
                            "title" => draft.title = value,
                            "link" => draft.link = value,
                            "description" => draft.description = value,
                            "guid" => draft.guid = value,
                            "pubDate" => draft.pub_date = value,
                            "category" => draft.category = value,
                            _ => {}
                        }
                    }
                } else if item.is_none() && parent_is(&path, "channel") {
                    match name.as_str() {
                        "title" => channel.title = value,
                        "link" => channel.link = value,
                        "description" => channel.description = value,
                        "language" => channel.language = value,
                        "lastBuildDate" => channel.last_build_date = parse_date(&value),
                        "pubDate" => channel_pub_date = Some(value),
                        _ => {}
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = path.last() {
        return Err(FeedError::Deserialization(format!(
            "document ends inside <{open}>"
        )));
    }
    if !saw_rss {
        return Err(FeedError::Deserialization("missing <rss> root element".to_string()));
    }
    if !saw_channel {
        return Err(FeedError::Deserialization("missing <channel> element".to_string()));
    }
    if channel.last_build_date.is_none() {
        channel.last_build_date = channel_pub_date.as_deref().and_then(parse_date);
    }

    Ok(FeedDocument { channel, entries })
}

/// Track structure on every opening tag and reject foreign roots.
fn enter(
    name: &str,
    path: &[String],
    saw_rss: &mut bool,
    saw_channel: &mut bool,
    item: &mut Option<ItemDraft>,
) -> Result<()> {
    if path.is_empty() {
        if name != "rss" {
            return Err(FeedError::Deserialization(format!(
                "root element is <{name}>, expected <rss>"
            )));
        }
        *saw_rss = true;
    } else if name == "channel" && parent_is(path, "rss") {
        *saw_channel = true;
    } else if name == "item" && parent_is(path, "channel") {
        *item = Some(ItemDraft::default());
    }
    Ok(())
}

fn parent_is(path: &[String], name: &str) -> bool {
    path.last().is_some_and(|p| p == name)
}

fn push_entry(draft: ItemDraft, entries: &mut Vec<FeedEntry>, seen: &mut HashSet<String>) {
    if draft.link.trim().is_empty() {
        warn!(title = %draft.title, "skipping feed item without a link");
        return;
    }
    let guid = if draft.guid.trim().is_empty() {
        guid_for_link(draft.link.trim())
    } else {
        draft.guid
    };
    if !seen.insert(guid.clone()) {
        warn!(%guid, "skipping duplicate feed item");
        return;
    }
    entries.push(FeedEntry {
        title: draft.title,
        link: draft.link,
        description: draft.description,
        guid,
        pub_date: draft.pub_date,
        grade_label: draft.category,
    });
}

fn parse_date(value: &str) -> Option<chrono::DateTime<chrono::FixedOffset>> {
    let parsed = DateTime::parse_from_rfc2822(value.trim()).ok();
    if parsed.is_none() {
        warn!(value, "ignoring unparseable channel date");
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn channel() -> Channel {
        Channel {
            title: "UNFPA Job Vacancies".to_string(),
            link: "https://www.unfpa.org/jobs".to_string(),
            description: "List of vacancies at UNFPA".to_string(),
            language: "en".to_string(),
            self_link: Some("https://example.github.io/jobs.xml".to_string()),
            last_build_date: Some(Utc.with_ymd_and_hms(2026, 10, 14, 6, 0, 0).unwrap().fixed_offset()),
        }
    }

    fn entry(n: u32) -> FeedEntry {
        FeedEntry {
            title: format!("Specialist #{n} & <Advisor>"),
            link: format!("https://www.unfpa.org/jobs/specialist-{n}?ref=a&b=c"),
            description: format!("UNFPA has a vacancy for <b>{n}</b>. Location: Unknown."),
            guid: guid_for_link(&format!("https://www.unfpa.org/jobs/specialist-{n}")),
            pub_date: "Tue, 13 Oct 2026 08:00:00 +0000".to_string(),
            grade_label: if n % 2 == 0 { "P-3".to_string() } else { String::new() },
        }
    }

    #[test]
    fn test_round_trip_empty() {
        let doc = FeedDocument::new(channel());
        assert_eq!(from_rss(&to_rss(&doc).unwrap()).unwrap(), doc);
    }

    #[test]
    fn test_round_trip_one() {
        let doc = FeedDocument {
            channel: channel(),
            entries: vec![entry(1)],
        };
        assert_eq!(from_rss(&to_rss(&doc).unwrap()).unwrap(), doc);
    }

    #[test]
    fn test_round_trip_many_and_stable_bytes() {
        let doc = FeedDocument {
            channel: Channel {
                self_link: None,
                ..channel()
            },
            entries: (1..=12).map(entry).collect(),
        };
        let xml = to_rss(&doc).unwrap();
        let back = from_rss(&xml).unwrap();
        assert_eq!(back, doc);
        assert_eq!(to_rss(&back).unwrap(), xml);
    }

    #[test]
    fn test_description_with_cdata_terminator() {
        let mut e = entry(3);
        e.description = "odd ]]> text".to_string();
        let doc = FeedDocument {
            channel: channel(),
            entries: vec![e],
        };
        assert_eq!(from_rss(&to_rss(&doc).unwrap()).unwrap(), doc);
    }

    #[test]
    fn test_output_shape() {
        let doc = FeedDocument {
            channel: channel(),
            entries: vec![entry(2)],
        };
        let xml = to_rss(&doc).unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<rss version="2.0""#));
        assert!(xml.contains(r#"<atom:link href="https://example.github.io/jobs.xml" rel="self" type="application/rss+xml"/>"#));
        assert!(xml.contains("<description><![CDATA[UNFPA has a vacancy for <b>2</b>."));
        assert!(xml.contains(r#"<guid isPermaLink="false">"#));
        assert!(xml.contains("<category>P-3</category>"));
        assert!(xml.contains(r#"<source url="https://www.unfpa.org/jobs">UNFPA Job Vacancies</source>"#));
        assert!(xml.contains("<lastBuildDate>Wed, 14 Oct 2026 06:00:00 +0000</lastBuildDate>"));
    }

    #[test]
    fn test_missing_channel_field_is_serialization_error() {
        let doc = FeedDocument::new(Channel {
            description: String::new(),
            ..channel()
        });
        let err = to_rss(&doc).unwrap_err();
        assert_eq!(err.kind(), "serialization_error");
        assert!(err.to_string().contains("description"));
    }

    #[test]
    fn test_reads_legacy_feed() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:atom="http://www.w3.org/2005/Atom" version="2.0">
  <channel>
    <title>UNFPA Job Vacancies</title>
    <link>https://www.unfpa.org/jobs</link>
    <description><![CDATA[List of vacancies at UNFPA]]></description>
    <language>en</language>
    <atom:link href="https://cinfoposte.github.io/unfpa-jobs/unfpa_jobs.xml" rel="self" type="application/rss+xml"/>
    <pubDate>Mon, 12 Oct 2026 06:00:00 +0000</pubDate>
    <item>
      <title>Technical Specialist</title>
      <link>https://www.unfpa.org/jobs/technical-specialist</link>
      <description><![CDATA[UNFPA has a vacancy for the position of Technical Specialist.]]></description>
      <guid isPermaLink="false">1234567890123456</guid>
      <pubDate>Mon, 12 Oct 2026 06:00:00 +0000</pubDate>
      <source url="https://www.unfpa.org/jobs">UNFPA Job Vacancies</source>
    </item>
    <item>
      <title>No guid here</title>
      <link>https://www.unfpa.org/jobs/no-guid</link>
    </item>
    <item>
      <title>Duplicate</title>
      <link>https://www.unfpa.org/jobs/technical-specialist-copy</link>
      <guid>1234567890123456</guid>
    </item>
    <item><title>No link</title></item>
  </channel>
</rss>"#;
        let doc = from_rss(xml).unwrap();
        assert_eq!(doc.channel.description, "List of vacancies at UNFPA");
        assert_eq!(
            doc.channel.self_link.as_deref(),
            Some("https://cinfoposte.github.io/unfpa-jobs/unfpa_jobs.xml")
        );
        assert_eq!(
            doc.channel.last_build_date.map(|d| d.timestamp()),
            Some(Utc.with_ymd_and_hms(2026, 10, 12, 6, 0, 0).unwrap().timestamp())
        );
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.entries[0].guid, "1234567890123456");
        assert_eq!(doc.entries[0].grade_label, "");
        assert_eq!(doc.entries[1].guid, guid_for_link("https://www.unfpa.org/jobs/no-guid"));
        assert_eq!(doc.entries[1].pub_date, "");
    }

    #[test]
    fn test_rejects_non_rss() {
        for bad in ["", "not xml at all", "<feed><entry/></feed>", "<rss version=\"2.0\"></rss>", "<rss><channel><item></channel></rss>", "<rss><channel>"] {
            let err = from_rss(bad).unwrap_err();
            assert_eq!(err.kind(), "deserialization_error", "input: {bad:?}");
        }
    }
}
