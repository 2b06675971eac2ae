//! WPL (Windows Media Player playlist)

use super::{xml_write_error, PlaylistFormat};
use crate::entry::{PlaylistEntry, ResolutionContext};
use crate::error::Result;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

const WPL_HEADER: &str = "<?wpl version=\"1.0\" encoding=\"UTF-8\"?>\n";

pub(super) fn parse(text: &str, ctx: &ResolutionContext) -> Vec<PlaylistEntry> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut entries = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"media" => {
                let src = e
                    .attributes()
                    .filter_map(|attr| attr.ok())
                    .find(|attr| attr.key.as_ref() == b"src")
                    .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()));
                if let Some(src) = src {
                    entries.push(PlaylistEntry::new(&src, ctx));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!("Stopping WPL parse at position {}: {}", reader.buffer_position(), e);
                break;
            }
            _ => {}
        }
    }

    entries
}

pub(super) fn write(entries: &[PlaylistEntry]) -> Result<Vec<u8>> {
    let err = |e: quick_xml::Error| xml_write_error(PlaylistFormat::Wpl, e);
    let mut writer = Writer::new_with_indent(WPL_HEADER.as_bytes().to_vec(), b' ', 2);

    for name in ["smil", "body", "seq"] {
        writer
            .write_event(Event::Start(BytesStart::new(name)))
            .map_err(err)?;
    }

    for entry in entries {
        writer
            .write_event(Event::Empty(
                BytesStart::new("media").with_attributes([("src", entry.uri())]),
            ))
            .map_err(err)?;
    }

    for name in ["seq", "body", "smil"] {
        writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(err)?;
    }

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}
