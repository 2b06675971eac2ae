//! PLS (`[playlist]` ini-style)

use crate::entry::{PlaylistEntry, ResolutionContext, TrackTags};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static FILE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^File(\d+)\s*=\s*(.+?)\s*$").expect("FILE_LINE pattern"));
static TITLE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Title(\d+)\s*=\s*(.+?)\s*$").expect("TITLE_LINE pattern"));

pub(super) fn parse(text: &str, ctx: &ResolutionContext) -> Vec<PlaylistEntry> {
    let mut files: Vec<(String, String)> = Vec::new();
    let mut titles: HashMap<String, String> = HashMap::new();

    for line in text.lines().map(str::trim) {
        if let Some(caps) = FILE_LINE.captures(line) {
            files.push((caps[1].to_string(), caps[2].to_string()));
        } else if let Some(caps) = TITLE_LINE.captures(line) {
            titles.insert(caps[1].to_string(), caps[2].to_string());
        }
    }

    files
        .into_iter()
        .map(|(number, uri)| {
            let tags = TrackTags {
                title: titles.remove(&number),
                ..Default::default()
            };
            PlaylistEntry::new(&uri, ctx).with_tags(tags)
        })
        .collect()
}

pub(super) fn write(entries: &[PlaylistEntry]) -> String {
    let mut out = String::from("[playlist]\n");

    for (i, entry) in entries.iter().enumerate() {
        let number = i + 1;
        out.push_str(&format!("File{}={}\n", number, entry.uri()));
        if let Some(title) = entry.tags().and_then(|tags| tags.title.as_ref()) {
            out.push_str(&format!("Title{}={}\n", number, title));
        }
    }

    out.push_str(&format!("NumberOfEntries={}\nVersion=2\n", entries.len()));
    out
}
