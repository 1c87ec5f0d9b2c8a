//! Rhythmbox database (rhythmdb.xml) parser

use super::model::RhythmboxEntry;
use crate::model::{AudioId, Track};
use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Parse rhythmdb.xml and extract all song entries
pub fn parse_database(path: &Path) -> Result<Vec<Track>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open Rhythmbox database: {:?}", path))?;
    let tracks = parse_entries(BufReader::new(file));
    log::info!("Parsed {} tracks from Rhythmbox database", tracks.len());
    Ok(tracks)
}

fn parse_entries<R: BufRead>(source: R) -> Vec<Track> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(true);

    let mut tracks = Vec::new();
    let mut current_entry: Option<RhythmboxEntry> = None;
    let mut current_element = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.name();
                if name.as_ref() == b"entry" {
                    let is_song = e.attributes().flatten().any(|attr| {
                        attr.key.as_ref() == b"type" && attr.value.as_ref() == b"song"
                    });
                    if is_song {
                        current_entry = Some(RhythmboxEntry::new());
                    }
                } else if current_entry.is_some() {
                    current_element = String::from_utf8_lossy(name.as_ref()).to_string();
                }
            }

            Ok(Event::Text(e)) => {
                if let Some(ref mut entry) = current_entry {
                    let text = e.unescape().unwrap_or_default().to_string();
                    match current_element.as_str() {
                        "title" => entry.title = Some(text),
                        "artist" => entry.artist = Some(text),
                        "album" => entry.album = Some(text),
                        "location" => entry.location = Some(text),
                        "mb-trackid" => entry.mb_trackid = Some(text),
                        "duration" => entry.duration = text.parse::<u32>().ok(),
                        _ => {}
                    }
                }
            }

            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"entry" {
                    if let Some(track) = current_entry.take().as_ref().and_then(entry_to_track) {
                        tracks.push(track);
                    }
                }
                current_element.clear();
            }

            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!(
                    "XML parsing error at position {}: {:?}",
                    reader.buffer_position(),
                    e
                );
            }
            _ => {}
        }

        buf.clear();
    }

    tracks
}

/// Convert a RhythmboxEntry to a library Track
fn entry_to_track(entry: &RhythmboxEntry) -> Option<Track> {
    let title = entry.title.clone()?;
    let file_path = entry.file_path()?;

    let id = format!("{:x}", md5::compute(file_path.to_string_lossy().as_bytes()));

    let track_ids = entry
        .mb_trackid
        .iter()
        .filter(|value| !value.trim().is_empty())
        .map(|value| AudioId::musicbrainz(value.trim()))
        .collect();

    Some(Track {
        id,
        title,
        artist: entry
            .artist
            .clone()
            .unwrap_or_else(|| "Unknown Artist".to_string()),
        album: entry
            .album
            .clone()
            .unwrap_or_else(|| "Unknown Album".to_string()),
        duration_ms: entry.duration.unwrap_or(0).saturating_mul(1000),
        file_path,
        track_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Generator;

    const RHYTHMDB: &str = r#"<?xml version="1.0" standalone="yes"?>
<rhythmdb version="2.0">
  <entry type="song">
    <title>Windowlicker</title>
    <artist>Aphex Twin</artist>
    <album>Windowlicker</album>
    <duration>367</duration>
    <location>file:///music/Aphex%20Twin/Windowlicker.flac</location>
    <mb-trackid>1D5B5C4A-0000-4000-8000-000000000001</mb-trackid>
  </entry>
  <entry type="song">
    <title>No MBID</title>
    <duration>200</duration>
    <location>file:///music/no-mbid.mp3</location>
  </entry>
  <entry type="iradio">
    <title>Radio</title>
    <location>http://stream.example.com/</location>
  </entry>
  <entry type="song">
    <title>Remote</title>
    <location>smb://nas/music/remote.mp3</location>
  </entry>
</rhythmdb>"#;

    #[test]
    fn test_parse_entries_keeps_local_songs() {
        let tracks = parse_entries(RHYTHMDB.as_bytes());
        assert_eq!(tracks.len(), 2);

        let first = &tracks[0];
        assert_eq!(first.title, "Windowlicker");
        assert_eq!(first.duration_ms, 367_000);
        assert_eq!(
            first.file_path,
            Path::new("/music/Aphex Twin/Windowlicker.flac")
        );
        assert_eq!(
            first.track_ids_of(&Generator::MusicBrainzTrack),
            vec!["1d5b5c4a-0000-4000-8000-000000000001".to_string()]
        );

        let second = &tracks[1];
        assert_eq!(second.artist, "Unknown Artist");
        assert!(second.track_ids.is_empty());
    }
}
