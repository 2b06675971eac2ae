//! Playlist file formats
//!
//! Five text formats are supported for reading and writing: M3U, PLS, ASX,
//! XSPF and WPL. Input is recognized by its first bytes, never by file
//! extension; extensions are only used to decide whether a path *looks*
//! like a playlist and which format to write.

mod asx;
mod m3u;
mod pls;
mod wpl;
mod xspf;

use crate::entry::{PlaylistEntry, ResolutionContext};
use crate::error::{PlaylistError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Number of leading bytes examined by [`detect_format`]
pub const DETECT_LENGTH: usize = 50;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

static M3U_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#EXTM3U(?:[\r\n ]|$)").expect("M3U_HEADER pattern"));
static PLS_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[playlist\](?:[\r\n]|$)").expect("PLS_HEADER pattern"));
static ASX_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:<\?xml[^?]+\?>)?[\r\n\s]*<asx[\s>]").expect("ASX_HEADER pattern"));
static WPL_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<\?wpl[\s>]").expect("WPL_HEADER pattern"));
static XSPF_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:<\?xml[^?]+\?>)?\s*<playlist[\s>]").expect("XSPF_HEADER pattern"));

/// Playlist file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistFormat {
    M3u,
    Pls,
    Asx,
    Xspf,
    Wpl,
    /// CUE sheets are read through the CUE parser and cannot be written
    Cue,
}

impl PlaylistFormat {
    /// Formats that can be written
    pub const WRITABLE: [PlaylistFormat; 5] = [Self::M3u, Self::Pls, Self::Asx, Self::Xspf, Self::Wpl];

    /// Look up a format by name (`"M3U"`, `"xspf"`, ...)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "M3U" => Some(Self::M3u),
            "PLS" => Some(Self::Pls),
            "ASX" => Some(Self::Asx),
            "XSPF" => Some(Self::Xspf),
            "WPL" => Some(Self::Wpl),
            "CUE" => Some(Self::Cue),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::M3u => "M3U",
            Self::Pls => "PLS",
            Self::Asx => "ASX",
            Self::Xspf => "XSPF",
            Self::Wpl => "WPL",
            Self::Cue => "CUE",
        }
    }

    /// Preferred file extension (without the dot)
    pub fn extension(self) -> &'static str {
        match self {
            Self::M3u => "m3u",
            Self::Pls => "pls",
            Self::Asx => "asx",
            Self::Xspf => "xspf",
            Self::Wpl => "wpl",
            Self::Cue => "cue",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "m3u" | "m3u8" => Some(Self::M3u),
            "pls" => Some(Self::Pls),
            "asx" => Some(Self::Asx),
            "xspf" => Some(Self::Xspf),
            "wpl" => Some(Self::Wpl),
            "cue" => Some(Self::Cue),
            _ => None,
        }
    }

    /// Format implied by a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// Whether `path` carries a playlist extension (`m3u`, `m3u8`, `pls`,
/// `asx`, `xspf`, `wpl`, `cue`)
pub fn has_supported_extension(path: &Path) -> Option<PlaylistFormat> {
    PlaylistFormat::from_path(path)
}

/// Skip a UTF-8 byte-order mark
pub fn skip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

/// Detect the format of playlist content from its first bytes
pub fn detect_format(bytes: &[u8]) -> Option<PlaylistFormat> {
    let bytes = skip_bom(bytes);
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(DETECT_LENGTH)]);

    let format = if M3U_HEADER.is_match(&head) {
        PlaylistFormat::M3u
    } else if PLS_HEADER.is_match(&head) {
        PlaylistFormat::Pls
    } else if ASX_HEADER.is_match(&head) {
        PlaylistFormat::Asx
    } else if WPL_HEADER.is_match(&head) {
        PlaylistFormat::Wpl
    } else if XSPF_HEADER.is_match(&head) {
        PlaylistFormat::Xspf
    } else {
        return None;
    };

    tracing::debug!("Detected {} playlist", format.name());
    Some(format)
}

/// Parse playlist content, resolving relative entries against `ctx`
pub fn parse(bytes: &[u8], ctx: &ResolutionContext) -> Result<Vec<PlaylistEntry>> {
    let format = detect_format(bytes)
        .ok_or_else(|| PlaylistError::InvalidFormat("unrecognized playlist header".to_string()))?;
    let body = skip_bom(bytes);

    Ok(match format {
        PlaylistFormat::M3u => m3u::parse(body, ctx),
        PlaylistFormat::Pls => pls::parse(&String::from_utf8_lossy(body), ctx),
        PlaylistFormat::Asx => asx::parse(&String::from_utf8_lossy(body), ctx),
        PlaylistFormat::Xspf => xspf::parse(&String::from_utf8_lossy(body), ctx),
        PlaylistFormat::Wpl => wpl::parse(&String::from_utf8_lossy(body), ctx),
        PlaylistFormat::Cue => Vec::new(),
    })
}

/// Read and parse a playlist file
///
/// Relative entries resolve against the playlist's own directory.
pub fn parse_file(path: &Path) -> Result<Vec<PlaylistEntry>> {
    let bytes = read_file(path)?;
    parse(&bytes, &ResolutionContext::for_file(path)).map_err(|e| match e {
        PlaylistError::InvalidFormat(_) => {
            PlaylistError::InvalidFormat(path.display().to_string())
        }
        other => other,
    })
}

/// Read a whole file, telling open failures apart from read failures
pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path).map_err(|source| PlaylistError::OpenFail {
        path: path.to_path_buf(),
        source,
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|source| PlaylistError::ReadError {
            context: path.display().to_string(),
            source,
        })?;
    Ok(bytes)
}

/// Serialize entries
pub fn write(format: PlaylistFormat, entries: &[PlaylistEntry]) -> Result<Vec<u8>> {
    match format {
        PlaylistFormat::M3u => Ok(m3u::write(entries).into_bytes()),
        PlaylistFormat::Pls => Ok(pls::write(entries).into_bytes()),
        PlaylistFormat::Asx => asx::write(entries),
        PlaylistFormat::Xspf => xspf::write(entries),
        PlaylistFormat::Wpl => wpl::write(entries),
        PlaylistFormat::Cue => Err(PlaylistError::InvalidFormat(
            "CUE sheets cannot be written".to_string(),
        )),
    }
}

/// Serialize entries to a file
pub fn write_file(path: &Path, format: PlaylistFormat, entries: &[PlaylistEntry]) -> Result<()> {
    let bytes = write(format, entries)?;
    std::fs::write(path, bytes).map_err(|source| PlaylistError::WriteError {
        context: path.display().to_string(),
        source,
    })
}

/// Map an XML reader or writer failure
fn xml_write_error(format: PlaylistFormat, err: quick_xml::Error) -> PlaylistError {
    PlaylistError::write_failed(format.name(), err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_by_content_not_extension() {
        assert_eq!(detect_format(b"#EXTM3U\n/a.mp3\n"), Some(PlaylistFormat::M3u));
        assert_eq!(detect_format(b"\xEF\xBB\xBF#EXTM3U\r\n"), Some(PlaylistFormat::M3u));
        assert_eq!(detect_format(b"[playlist]\nFile1=a.mp3\n"), Some(PlaylistFormat::Pls));
        assert_eq!(detect_format(b"<ASX version=\"3.0\">"), Some(PlaylistFormat::Asx));
        assert_eq!(
            detect_format(b"<?xml version=\"1.0\"?>\n<asx version=\"3.0\">"),
            Some(PlaylistFormat::Asx)
        );
        assert_eq!(detect_format(b"<?wpl version=\"1.0\"?>"), Some(PlaylistFormat::Wpl));
        assert_eq!(
            detect_format(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<playlist version=\"1\">"),
            Some(PlaylistFormat::Xspf)
        );
    }

    #[test]
    fn rejects_unknown_content() {
        assert_eq!(detect_format(b"/music/a.mp3\n/music/b.mp3\n"), None);
        assert_eq!(detect_format(b"#EXTM3Ux"), None);
        assert_eq!(detect_format(b""), None);

        let err = parse(b"just text", &ResolutionContext::default()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidFormat);
    }

    #[test]
    fn header_must_fit_in_detect_window() {
        let mut content = vec![b' '; DETECT_LENGTH];
        content.extend_from_slice(b"<asx>");
        assert_eq!(detect_format(&content), None);
    }

    #[test]
    fn format_names_and_extensions() {
        assert_eq!(PlaylistFormat::from_name("xspf"), Some(PlaylistFormat::Xspf));
        assert_eq!(PlaylistFormat::from_name("ogg"), None);
        assert_eq!(PlaylistFormat::from_extension("M3U8"), Some(PlaylistFormat::M3u));
        assert_eq!(
            PlaylistFormat::from_path(Path::new("/music/album.cue")),
            Some(PlaylistFormat::Cue)
        );
        assert_eq!(PlaylistFormat::Wpl.extension(), "wpl");
        assert_eq!(PlaylistFormat::Asx.name(), "ASX");
    }

    #[test]
    fn cue_cannot_be_written() {
        let err = write(PlaylistFormat::Cue, &[]).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidFormat);
    }

    #[test]
    fn open_and_read_failures_differ() {
        let temp = tempfile::TempDir::new().unwrap();

        let err = parse_file(&temp.path().join("missing.m3u")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::OpenFail);

        // Directories open fine on Unix but cannot be read
        let err = parse_file(temp.path()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ReadError);
    }

    #[test]
    fn every_writable_format_detects_its_own_output() {
        let ctx = ResolutionContext::default();
        let entries = vec![
            PlaylistEntry::new("/music/a.mp3", &ctx),
            PlaylistEntry::new("http://radio.example.com/live", &ctx),
        ];

        for format in PlaylistFormat::WRITABLE {
            let bytes = write(format, &entries).unwrap();
            assert_eq!(detect_format(&bytes), Some(format), "{}", format.name());

            let parsed = parse(&bytes, &ctx).unwrap();
            let uris: Vec<&str> = parsed.iter().map(PlaylistEntry::uri).collect();
            assert_eq!(uris, vec!["/music/a.mp3", "http://radio.example.com/live"]);
        }
    }
}
