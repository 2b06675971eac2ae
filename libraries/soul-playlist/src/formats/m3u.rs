//! M3U / extended M3U

use crate::entry::{PlaylistEntry, ResolutionContext, TrackTags};
use once_cell::sync::Lazy;
use regex::Regex;

static EXTINF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#EXTINF:[^,]*,(.*)$").expect("EXTINF pattern"));

/// Decodes lines as UTF-8 until one fails, then as Latin-1 for the rest
/// of the file.
struct LineDecoder {
    latin1: bool,
}

impl LineDecoder {
    fn decode(&mut self, line: &[u8]) -> String {
        if !self.latin1 {
            match std::str::from_utf8(line) {
                Ok(text) => return text.to_string(),
                Err(_) => {
                    tracing::debug!("M3U is not UTF-8, switching to Latin-1");
                    self.latin1 = true;
                }
            }
        }
        line.iter().map(|&byte| char::from(byte)).collect()
    }
}

pub(super) fn parse(bytes: &[u8], ctx: &ResolutionContext) -> Vec<PlaylistEntry> {
    let mut decoder = LineDecoder { latin1: false };
    let mut pending = TrackTags::default();
    let mut entries = Vec::new();

    for raw in bytes.split(|&byte| byte == b'\n') {
        let line = decoder.decode(raw);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = EXTINF.captures(line) {
            pending.title = Some(caps[1].to_string());
        } else if let Some(album) = line.strip_prefix("#EXTALB:") {
            pending.album = Some(album.to_string());
        } else if let Some(artist) = line.strip_prefix("#EXTART:") {
            pending.artist = Some(artist.to_string());
        } else if let Some(genre) = line.strip_prefix("#EXTGENRE:") {
            pending.genre = Some(genre.to_string());
        } else if !line.starts_with('#') {
            let tags = std::mem::take(&mut pending);
            entries.push(PlaylistEntry::new(line, ctx).with_tags(tags));
        }
    }

    entries
}

pub(super) fn write(entries: &[PlaylistEntry]) -> String {
    let mut out = String::from("#EXTM3U\n");

    for entry in entries {
        if let Some(tags) = entry.tags() {
            if let Some(title) = &tags.title {
                out.push_str(&format!("#EXTINF:-1,{}\n", title));
            }
            if let Some(artist) = &tags.artist {
                out.push_str(&format!("#EXTART:{}\n", artist));
            }
            if let Some(album) = &tags.album {
                out.push_str(&format!("#EXTALB:{}\n", album));
            }
            if let Some(genre) = &tags.genre {
                out.push_str(&format!("#EXTGENRE:{}\n", genre));
            }
        }
        out.push_str(entry.uri());
        out.push('\n');
    }

    out
}
