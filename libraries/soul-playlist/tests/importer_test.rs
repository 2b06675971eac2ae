//! Directory and playlist import tests
//!
//! Every test builds a real directory tree in a temp dir.


use soul_playlist::{
    ChannelType, CueSheetCache, ErrorKind, ExtensionResolver, Importer, LoadFlags, Source,
};
use std::path::Path;
use tempfile::TempDir;
use test_helpers::{cue_single_file, cue_with_files, init_tracing, touch, write_file};

// ===== Helpers =====

fn import_directory(dir: &Path, flags: LoadFlags) -> (Vec<Source>, Option<ErrorKind>) {
    init_tracing();
    let backend = ExtensionResolver::default();
    let mut cues = CueSheetCache::new();
    let mut importer = Importer::new(&backend, &mut cues);
    let added = importer.add_from_directory(dir, flags);
    let (sources, last_error) = importer.finish();
    assert_eq!(added, sources.len());
    (sources, last_error.map(|e| e.kind))
}

fn import_playlist(path: &Path, flags: LoadFlags) -> (Vec<Source>, Option<ErrorKind>) {
    init_tracing();
    let backend = ExtensionResolver::default();
    let mut cues = CueSheetCache::new();
    let mut importer = Importer::new(&backend, &mut cues);
    let added = importer.add_from_playlist(path, flags);
    let (sources, last_error) = importer.finish();
    assert_eq!(added, sources.len());
    (sources, last_error.map(|e| e.kind))
}

fn uris(sources: &[Source]) -> Vec<String> {
    sources.iter().map(|s| s.uri().to_string()).collect()
}

// ===== Directories =====

#[test]
fn cue_sheet_replaces_the_files_it_names() {
    let temp = TempDir::new().unwrap();
    touch(temp.path(), "01.flac");
    touch(temp.path(), "02.flac");
    let cue = write_file(temp.path(), "album.cue", &cue_with_files(&["01.flac", "02.flac"]));

    let (sources, _) = import_directory(temp.path(), LoadFlags::default());

    assert_eq!(sources.len(), 2);
    for (i, source) in sources.iter().enumerate() {
        let track = source.cue_track().expect("CUE track source");
        assert_eq!(track.index(), i);
        assert_eq!(source.uri(), format!("{}:{}", cue.display(), i));
        assert_eq!(source.channel_type(), ChannelType::Plugin);
    }
    assert!(sources.iter().all(|s| !s.uri().ends_with(".flac")));
    assert!(sources[1].data_file().ends_with("02.flac"));
}

#[test]
fn cue_sheet_hides_audio_sharing_its_base_name() {
    let temp = TempDir::new().unwrap();
    touch(temp.path(), "live.flac");
    touch(temp.path(), "bonus.mp3");
    write_file(temp.path(), "live.cue", &cue_single_file(3));

    let (sources, last_error) = import_directory(temp.path(), LoadFlags::default());

    assert_eq!(sources.len(), 4);
    assert!(sources[0].uri().ends_with("bonus.mp3"));
    assert!(sources[1..].iter().all(|s| s.cue_track().is_some()));
    assert!(sources[3].data_file().ends_with("live.flac"));
    assert_eq!(last_error, None);

    let tags = sources[2].tags().unwrap();
    assert_eq!(tags.title.as_deref(), Some("Part 2"));
    assert_eq!(tags.album.as_deref(), Some("Live"));
    assert_eq!(tags.track_index, Some(2));
    assert_eq!(tags.track_count, Some(3));
}

#[test]
fn subdirectories_come_first_in_natural_order() {
    let temp = TempDir::new().unwrap();
    touch(temp.path(), "b.mp3");
    touch(temp.path(), "a.mp3");
    touch(temp.path(), "disc10/x.ogg");
    touch(temp.path(), "disc2/x.ogg");
    touch(temp.path(), "disc2/notes.txt");

    let (sources, _) = import_directory(temp.path(), LoadFlags::default());
    let names: Vec<String> = sources
        .iter()
        .map(|s| {
            let path = Path::new(s.uri());
            let dir = path.parent().unwrap().file_name().unwrap().to_string_lossy();
            format!("{}/{}", dir, path.file_name().unwrap().to_string_lossy())
        })
        .collect();

    let root = temp.path().canonicalize().unwrap();
    let root_name = root.file_name().unwrap().to_string_lossy().to_string();
    assert_eq!(
        names,
        vec![
            "disc2/x.ogg".to_string(),
            "disc10/x.ogg".to_string(),
            format!("{root_name}/a.mp3"),
            format!("{root_name}/b.mp3"),
        ]
    );
}

#[test]
fn playlists_in_directories_need_load_playlists() {
    let temp = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    let outside = touch(elsewhere.path(), "outside.mp3");
    touch(temp.path(), "a.mp3");
    write_file(temp.path(), "list.m3u", &format!("#EXTM3U\n{}\n", outside.display()));

    let (sources, _) = import_directory(temp.path(), LoadFlags::default());
    assert_eq!(sources.len(), 1);

    let flags = LoadFlags {
        load_playlists: true,
        ..Default::default()
    };
    let (sources, _) = import_directory(temp.path(), flags);
    assert_eq!(sources.len(), 2);
    assert!(uris(&sources).contains(&outside.display().to_string()));
}

#[test]
fn empty_directory_reports_no_valid_files() {
    let temp = TempDir::new().unwrap();
    touch(temp.path(), "cover.jpg");

    let (sources, last_error) = import_directory(temp.path(), LoadFlags::default());

    assert!(sources.is_empty());
    assert_eq!(last_error, Some(ErrorKind::NoValidFilesFound));
}

#[test]
fn missing_directory_reports_path_not_found() {
    let temp = TempDir::new().unwrap();
    let (sources, last_error) = import_directory(&temp.path().join("nope"), LoadFlags::default());

    assert!(sources.is_empty());
    assert_eq!(last_error, Some(ErrorKind::PathNotFound));
}

// ===== Playlists =====

#[test]
fn playlist_entries_resolve_against_playlist_directory() {
    let temp = TempDir::new().unwrap();
    let top = touch(temp.path(), "top.mp3");
    let song = touch(temp.path(), "nested/song.ogg");
    let list = write_file(
        temp.path(),
        "nested/list.m3u",
        "#EXTM3U\n#EXTINF:12,Song\nsong.ogg\n../top.mp3\nhttp://radio.example.com/live\n",
    );

    let (sources, last_error) = import_playlist(&list, LoadFlags::default());

    assert_eq!(
        uris(&sources),
        vec![
            song.display().to_string(),
            top.display().to_string(),
            "http://radio.example.com/live".to_string(),
        ]
    );
    assert_eq!(sources[0].tags().unwrap().title.as_deref(), Some("Song"));
    assert_eq!(sources[2].channel_type(), ChannelType::Remote);
    assert_eq!(last_error, None);
}

#[test]
fn skip_dirs_ignores_directories_listed_in_playlists() {
    let temp = TempDir::new().unwrap();
    touch(temp.path(), "music/one.mp3");
    touch(temp.path(), "music/two.mp3");
    touch(temp.path(), "single.wav");
    let list = write_file(
        temp.path(),
        "list.pls",
        "[playlist]\nFile1=music\nFile2=single.wav\nNumberOfEntries=2\n",
    );

    let (sources, _) = import_playlist(&list, LoadFlags::default());
    assert_eq!(sources.len(), 3);

    let flags = LoadFlags {
        skip_dirs: true,
        ..Default::default()
    };
    let (sources, _) = import_playlist(&list, flags);
    assert_eq!(sources.len(), 1);
    assert!(sources[0].uri().ends_with("single.wav"));
}

#[test]
fn skip_playlists_still_reads_cue_sheets() {
    let temp = TempDir::new().unwrap();
    touch(temp.path(), "live.flac");
    write_file(temp.path(), "live.cue", &cue_single_file(2));
    touch(temp.path(), "inner/x.mp3");
    write_file(temp.path(), "inner.m3u", "#EXTM3U\ninner/x.mp3\n");
    let list = write_file(temp.path(), "outer.m3u", "#EXTM3U\nlive.cue\ninner.m3u\n");

    let flags = LoadFlags {
        skip_playlists: true,
        ..Default::default()
    };
    let (sources, _) = import_playlist(&list, flags);
    assert_eq!(sources.len(), 2);
    assert!(sources.iter().all(|s| s.cue_track().is_some()));

    let (sources, _) = import_playlist(&list, LoadFlags::default());
    assert_eq!(sources.len(), 3);
}

#[test]
fn self_including_playlist_terminates() {
    let temp = TempDir::new().unwrap();
    touch(temp.path(), "a.mp3");
    let list = write_file(temp.path(), "loop.m3u", "#EXTM3U\nloop.m3u\na.mp3\nloop.m3u\n");

    let (sources, _) = import_playlist(&list, LoadFlags::default());

    assert_eq!(sources.len(), 1);
}

#[test]
fn playlist_failures_are_recorded() {
    let temp = TempDir::new().unwrap();

    let empty = write_file(temp.path(), "empty.m3u", "#EXTM3U\n# nothing here\n");
    let (_, last_error) = import_playlist(&empty, LoadFlags::default());
    assert_eq!(last_error, Some(ErrorKind::PlaylistIsEmpty));

    let bogus = write_file(temp.path(), "bogus.m3u", "not a playlist\n");
    let (_, last_error) = import_playlist(&bogus, LoadFlags::default());
    assert_eq!(last_error, Some(ErrorKind::InvalidFormat));

    let (_, last_error) = import_playlist(&temp.path().join("gone.pls"), LoadFlags::default());
    assert_eq!(last_error, Some(ErrorKind::PathNotFound));
}

#[test]
fn add_url_rejects_local_files() {
    let backend = ExtensionResolver::default();
    let mut cues = CueSheetCache::new();
    let mut importer = Importer::new(&backend, &mut cues);
    let ctx = soul_playlist::ResolutionContext::default();

    let err = importer
        .add_url(soul_playlist::PlaylistEntry::new("/music/a.mp3", &ctx))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotUrl);

    importer
        .add_url(soul_playlist::PlaylistEntry::new("https://example.com/a.mp3", &ctx))
        .unwrap();
    assert_eq!(importer.sources().len(), 1);
}
