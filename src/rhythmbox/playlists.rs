//! Rhythmbox playlists (playlists.xml) parser
//!
//! Only static playlists carry an explicit track list. Automatic (smart)
//! playlists are skipped.

use super::model::uri_to_path;
use crate::model::{Playlist, Track};
use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Parse playlists.xml, resolving entries against the given tracks
pub fn parse_playlists(path: &Path, tracks: &[Track]) -> Result<Vec<Playlist>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open Rhythmbox playlists: {:?}", path))?;
    let playlists = parse_static_playlists(BufReader::new(file), tracks);
    log::info!("Parsed {} playlists from Rhythmbox", playlists.len());
    Ok(playlists)
}

fn parse_static_playlists<R: BufRead>(source: R, tracks: &[Track]) -> Vec<Playlist> {
    let path_to_id: HashMap<&PathBuf, &str> = tracks
        .iter()
        .map(|t| (&t.file_path, t.id.as_str()))
        .collect();

    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(true);

    let mut playlists = Vec::new();
    let mut current: Option<Playlist> = None;
    let mut in_location = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"playlist" => {
                    let mut name = String::from("Unnamed");
                    let mut kind = String::from("static");
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"name" => name = String::from_utf8_lossy(&attr.value).to_string(),
                            b"type" => kind = String::from_utf8_lossy(&attr.value).to_string(),
                            _ => {}
                        }
                    }
                    if kind == "static" {
                        current = Some(Playlist::new(name));
                    } else {
                        log::debug!("Skipping {} playlist: {}", kind, name);
                    }
                }
                b"location" => in_location = current.is_some(),
                _ => {}
            },

            Ok(Event::Text(e)) if in_location => {
                let text = e.unescape().unwrap_or_default().to_string();
                if let (Some(playlist), Some(file_path)) = (current.as_mut(), uri_to_path(&text)) {
                    match path_to_id.get(&file_path) {
                        Some(track_id) => playlist.push(*track_id),
                        None => log::debug!("Track not found for path: {:?}", file_path),
                    }
                }
            }

            Ok(Event::End(e)) => match e.name().as_ref() {
                b"playlist" => {
                    if let Some(playlist) = current.take() {
                        if playlist.is_empty() {
                            log::debug!("Skipping empty playlist: {}", playlist.name);
                        } else {
                            playlists.push(playlist);
                        }
                    }
                }
                b"location" => in_location = false,
                _ => {}
            },

            Ok(Event::Eof) => break,
            Err(e) => log::warn!("XML parsing error: {:?}", e),
            _ => {}
        }

        buf.clear();
    }

    playlists
}
