use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identifier namespace ("generator") of an [`AudioId`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Generator {
    /// MusicBrainz recording ID, stored as `musicbrainz_trackid` by most taggers
    MusicBrainzTrack,

    /// Any other scheme, keyed by name
    Other(String),
}

/// A namespaced external identifier attached to a track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioId {
    pub generator: Generator,
    pub id: String,
}

impl AudioId {
    pub fn new(generator: Generator, id: impl Into<String>) -> Self {
        Self {
            generator,
            id: id.into(),
        }
    }

    /// Shorthand for a MusicBrainz track ID
    pub fn musicbrainz(id: impl Into<String>) -> Self {
        Self::new(Generator::MusicBrainzTrack, id)
    }
}

/// Represents a single music track as known to the host library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Unique identifier for this track within the library
    pub id: String,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name
    pub album: String,

    /// Track duration in milliseconds
    pub duration_ms: u32,

    /// File path to the audio file
    pub file_path: PathBuf,

    /// External identifiers cached by the host (may differ from what the file embeds)
    pub track_ids: Vec<AudioId>,
}

impl Track {
    /// Lowercased identifier values for one generator, first occurrence wins
    pub fn track_ids_of(&self, generator: &Generator) -> Vec<String> {
        let mut values: Vec<String> = Vec::new();
        for audio_id in self.track_ids.iter().filter(|a| &a.generator == generator) {
            let value = audio_id.id.trim().to_lowercase();
            if !value.is_empty() && !values.contains(&value) {
                values.push(value);
            }
        }
        values
    }

    /// Display name used in user-visible messages
    pub fn display_name(&self) -> &str {
        &self.title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track_with(ids: Vec<AudioId>) -> Track {
        Track {
            id: "t1".to_string(),
            title: "Song".to_string(),
            artist: "Artist".to_string(),
            album: "Album".to_string(),
            duration_ms: 200_000,
            file_path: PathBuf::from("/music/song.flac"),
            track_ids: ids,
        }
    }

    #[test]
    fn test_track_ids_of_lowercases_and_dedups() {
        let track = track_with(vec![
            AudioId::musicbrainz("AAAA-1111"),
            AudioId::new(Generator::Other("isrc".to_string()), "USRC17607839"),
            AudioId::musicbrainz("aaaa-1111"),
            AudioId::musicbrainz("BBBB-2222"),
        ]);

        assert_eq!(
            track.track_ids_of(&Generator::MusicBrainzTrack),
            vec!["aaaa-1111".to_string(), "bbbb-2222".to_string()]
        );
    }

    #[test]
    fn test_track_ids_of_ignores_blank_values() {
        let track = track_with(vec![AudioId::musicbrainz("  ")]);
        assert!(track.track_ids_of(&Generator::MusicBrainzTrack).is_empty());
    }
}
