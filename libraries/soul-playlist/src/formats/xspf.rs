//! XSPF (XML Shareable Playlist Format)

use super::{xml_write_error, PlaylistFormat};
use crate::entry::{PlaylistEntry, ResolutionContext, TrackTags};
use crate::error::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use url::Url;

const XSPF_NAMESPACE: &str = "http://xspf.org/ns/0/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Location,
    Title,
    Creator,
    Album,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"location" => Some(Self::Location),
            b"title" => Some(Self::Title),
            b"creator" => Some(Self::Creator),
            b"album" => Some(Self::Album),
            _ => None,
        }
    }
}

#[derive(Default)]
struct PendingTrack {
    location: Option<String>,
    tags: TrackTags,
}

/// `file://` locations are percent-encoded URLs; turn them back into paths
fn decode_location(location: &str) -> String {
    if location.starts_with("file://") {
        if let Some(path) = Url::parse(location)
            .ok()
            .and_then(|url| url.to_file_path().ok())
        {
            return path.to_string_lossy().into_owned();
        }
    }
    location.to_string()
}

pub(super) fn parse(text: &str, ctx: &ResolutionContext) -> Vec<PlaylistEntry> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut entries = Vec::new();
    let mut track: Option<PendingTrack> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let local = e.local_name();
                if local.as_ref() == b"track" {
                    track = Some(PendingTrack::default());
                } else if track.is_some() {
                    field = Field::from_name(local.as_ref());
                }
            }
            Ok(Event::Text(t)) => {
                if let (Some(pending), Some(current)) = (track.as_mut(), field) {
                    let Ok(value) = t.unescape() else { continue };
                    let value = value.into_owned();
                    match current {
                        Field::Location => pending.location = Some(decode_location(&value)),
                        Field::Title => pending.tags.title = Some(value),
                        Field::Creator => pending.tags.artist = Some(value),
                        Field::Album => pending.tags.album = Some(value),
                    }
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"track" {
                    if let Some(PendingTrack {
                        location: Some(location),
                        tags,
                    }) = track.take()
                    {
                        entries.push(PlaylistEntry::new(&location, ctx).with_tags(tags));
                    }
                }
                field = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!("Stopping XSPF parse at position {}: {}", reader.buffer_position(), e);
                break;
            }
            _ => {}
        }
    }

    entries
}

pub(super) fn write(entries: &[PlaylistEntry]) -> Result<Vec<u8>> {
    let err = |e: quick_xml::Error| xml_write_error(PlaylistFormat::Xspf, e);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(err)?;
    writer
        .write_event(Event::Start(
            BytesStart::new("playlist").with_attributes([("version", "1"), ("xmlns", XSPF_NAMESPACE)]),
        ))
        .map_err(err)?;
    writer
        .write_event(Event::Start(BytesStart::new("trackList")))
        .map_err(err)?;

    for entry in entries {
        writer
            .write_event(Event::Start(BytesStart::new("track")))
            .map_err(err)?;

        let mut fields = vec![("location", entry.uri())];
        if let Some(tags) = entry.tags() {
            fields.extend(tags.title.as_deref().map(|v| ("title", v)));
            fields.extend(tags.artist.as_deref().map(|v| ("creator", v)));
            fields.extend(tags.album.as_deref().map(|v| ("album", v)));
        }
        for (name, value) in fields {
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(err)?;
            writer
                .write_event(Event::Text(BytesText::new(value)))
                .map_err(err)?;
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(err)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("track")))
            .map_err(err)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("trackList")))
        .map_err(err)?;
    writer
        .write_event(Event::End(BytesEnd::new("playlist")))
        .map_err(err)?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}
