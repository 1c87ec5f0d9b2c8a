//! Direct access to the tags embedded in audio files
//!
//! The host library may cache a MusicBrainz ID that was never written to
//! the file. The extractor only sees what is in the file, so the pipeline
//! asks the file itself through [`TagStore`].

use crate::model::{AudioId, Track};
use anyhow::{Context, Result};
use lofty::config::WriteOptions;
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::Tag;
use std::path::Path;

/// Reads and writes MusicBrainz track IDs embedded in audio files
pub trait TagStore: Send + Sync {
    /// Lowercased MusicBrainz track IDs found in the file's tags
    fn embedded_track_ids(&self, path: &Path) -> Result<Vec<String>>;

    /// Write `mbid` into the file's primary tag, creating the tag if needed
    fn embed_track_id(&self, path: &Path, mbid: &str) -> Result<()>;
}

/// [`TagStore`] backed by `lofty`
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyTagStore;

impl LoftyTagStore {
    pub fn new() -> Self {
        Self
    }
}

impl TagStore for LoftyTagStore {
    fn embedded_track_ids(&self, path: &Path) -> Result<Vec<String>> {
        let tagged_file = Probe::open(path)
            .with_context(|| format!("Failed to open {:?} for tag reading", path))?
            .read()
            .with_context(|| format!("Failed to read tags from {:?}", path))?;

        let mut ids: Vec<String> = Vec::new();
        for tag in tagged_file.tags() {
            for value in tag.get_strings(&ItemKey::MusicBrainzRecordingId) {
                let value = value.trim().to_lowercase();
                if !value.is_empty() && !ids.contains(&value) {
                    ids.push(value);
                }
            }
        }
        Ok(ids)
    }

    fn embed_track_id(&self, path: &Path, mbid: &str) -> Result<()> {
        let mut tagged_file = Probe::open(path)
            .with_context(|| format!("Failed to open {:?} for tagging", path))?
            .read()
            .with_context(|| format!("Failed to read tags from {:?}", path))?;

        let tag_type = tagged_file.primary_tag_type();
        if tagged_file.tag(tag_type).is_none() {
            tagged_file.insert_tag(Tag::new(tag_type));
        }
        let Some(tag) = tagged_file.tag_mut(tag_type) else {
            anyhow::bail!("No writable {:?} tag in {:?}", tag_type, path);
        };

        set_track_id(tag, mbid).with_context(|| format!("Cannot tag {:?}", path))?;

        tagged_file
            .save_to_path(path, WriteOptions::default())
            .with_context(|| format!("Failed to save tags to {:?}", path))?;

        log::debug!("Embedded MBID {} into {:?}", mbid, path);
        Ok(())
    }
}

/// Store `mbid` as the tag's MusicBrainz track ID
///
/// Fails when the tag format has no field for it.
fn set_track_id(tag: &mut Tag, mbid: &str) -> Result<()> {
    if !tag.insert_text(ItemKey::MusicBrainzRecordingId, mbid.to_string()) {
        anyhow::bail!("{:?} tags cannot hold a MusicBrainz track ID", tag.tag_type());
    }
    Ok(())
}

/// Build a [`Track`] straight from an audio file's tags and properties
pub fn read_track(path: &Path) -> Result<Track> {
    let tagged_file = Probe::open(path)
        .with_context(|| format!("Failed to open {:?}", path))?
        .read()
        .with_context(|| format!("Failed to read {:?}", path))?;

    let duration_ms = u32::try_from(tagged_file.properties().duration().as_millis())
        .unwrap_or(u32::MAX);

    let tag = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag());

    let file_stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let title = tag
        .and_then(|t| t.title().map(|s| s.to_string()))
        .unwrap_or(file_stem);
    let artist = tag
        .and_then(|t| t.artist().map(|s| s.to_string()))
        .unwrap_or_else(|| "Unknown Artist".to_string());
    let album = tag
        .and_then(|t| t.album().map(|s| s.to_string()))
        .unwrap_or_else(|| "Unknown Album".to_string());

    let track_ids = tagged_file
        .tags()
        .iter()
        .flat_map(|t| t.get_strings(&ItemKey::MusicBrainzRecordingId))
        .map(AudioId::musicbrainz)
        .collect();

    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    Ok(Track {
        id: format!("{:x}", md5::compute(absolute.to_string_lossy().as_bytes())),
        title,
        artist,
        album,
        duration_ms,
        file_path: absolute,
        track_ids,
    })
}
