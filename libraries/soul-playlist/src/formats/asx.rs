//! ASX (Advanced Stream Redirector)
//!
//! ASX files are loose XML: element and attribute names are matched
//! case-insensitively.

use super::{xml_write_error, PlaylistFormat};
use crate::entry::{PlaylistEntry, ResolutionContext, TrackTags};
use crate::error::Result;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

pub(super) fn parse(text: &str, ctx: &ResolutionContext) -> Vec<PlaylistEntry> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut entries = Vec::new();
    let mut in_entry = false;
    let mut in_title = false;
    let mut title: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = e.name();
                let name = name.as_ref();
                if name.eq_ignore_ascii_case(b"entry") {
                    in_entry = true;
                    title = None;
                } else if name.eq_ignore_ascii_case(b"title") && in_entry {
                    in_title = true;
                } else if name.eq_ignore_ascii_case(b"ref") {
                    let href = e
                        .attributes()
                        .filter_map(|attr| attr.ok())
                        .find(|attr| attr.key.as_ref().eq_ignore_ascii_case(b"href"))
                        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()));
                    if let Some(href) = href {
                        let tags = TrackTags {
                            title: title.clone(),
                            ..Default::default()
                        };
                        entries.push(PlaylistEntry::new(&href, ctx).with_tags(tags));
                    }
                }
            }
            Ok(Event::Text(t)) if in_title => {
                title = t.unescape().ok().map(|v| v.into_owned());
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                let name = name.as_ref();
                if name.eq_ignore_ascii_case(b"title") {
                    in_title = false;
                } else if name.eq_ignore_ascii_case(b"entry") {
                    in_entry = false;
                    title = None;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!("Stopping ASX parse at position {}: {}", reader.buffer_position(), e);
                break;
            }
            _ => {}
        }
    }

    entries
}

pub(super) fn write(entries: &[PlaylistEntry]) -> Result<Vec<u8>> {
    let err = |e: quick_xml::Error| xml_write_error(PlaylistFormat::Asx, e);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Start(BytesStart::new("asx").with_attributes([("version", "3.0")])))
        .map_err(err)?;

    for entry in entries {
        writer
            .write_event(Event::Start(BytesStart::new("entry")))
            .map_err(err)?;
        if let Some(title) = entry.tags().and_then(|tags| tags.title.as_deref()) {
            writer
                .write_event(Event::Start(BytesStart::new("title")))
                .map_err(err)?;
            writer
                .write_event(Event::Text(BytesText::new(title)))
                .map_err(err)?;
            writer
                .write_event(Event::End(BytesEnd::new("title")))
                .map_err(err)?;
        }
        writer
            .write_event(Event::Empty(
                BytesStart::new("ref").with_attributes([("href", entry.uri())]),
            ))
            .map_err(err)?;
        writer
            .write_event(Event::End(BytesEnd::new("entry")))
            .map_err(err)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("asx")))
        .map_err(err)?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_refs_with_titles() {
        let text = r#"<ASX VERSION="3.0">
  <Entry>
    <Title>Morning Show</Title>
    <Ref HREF="http://radio.example.com/morning"/>
  </Entry>
  <entry>
    <ref href="/music/a &amp; b.mp3"/>
  </entry>
</ASX>"#;
        let entries = parse(text, &ResolutionContext::default());

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].uri(), "http://radio.example.com/morning");
        assert_eq!(
            entries[0].tags().unwrap().title.as_deref(),
            Some("Morning Show")
        );
        assert_eq!(entries[1].uri(), "/music/a & b.mp3");
        assert!(entries[1].tags().is_none());
    }

    #[test]
    fn malformed_tail_keeps_earlier_entries() {
        let text = r#"<asx><entry><ref href="/a.mp3"/></entry></wrong><entry><ref href="/b.mp3"/></entry></asx>"#;
        let entries = parse(text, &ResolutionContext::default());
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn writer_escapes_attributes() {
        let entry = PlaylistEntry::new("/music/a & b.mp3", &ResolutionContext::default());
        let text = String::from_utf8(write(&[entry]).unwrap()).unwrap();

        assert!(text.starts_with("<asx version=\"3.0\">"));
        assert!(text.contains("<ref href=\"/music/a &amp; b.mp3\"/>"));
    }
}
