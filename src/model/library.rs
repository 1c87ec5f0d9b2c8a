use super::{Playlist, Track};
use std::collections::{HashMap, HashSet};

/// Host music library: tracks plus the playlists that reference them
#[derive(Debug, Clone, Default)]
pub struct Library {
    /// All tracks indexed by their ID
    tracks: HashMap<String, Track>,

    /// All playlists
    playlists: Vec<Playlist>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_track(&mut self, track: Track) {
        self.tracks.insert(track.id.clone(), track);
    }

    pub fn add_playlist(&mut self, playlist: Playlist) {
        self.playlists.push(playlist);
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn playlist_count(&self) -> usize {
        self.playlists.len()
    }

    /// Tracks in submission order (by file path, so runs are reproducible)
    pub fn sorted_tracks(&self) -> Vec<&Track> {
        let mut tracks: Vec<&Track> = self.tracks.values().collect();
        tracks.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        tracks
    }

    /// Tracks referenced by any of the named playlists, each at most once
    ///
    /// Unknown playlist names are logged and ignored.
    pub fn tracks_in_playlists(&self, names: &[String]) -> Vec<&Track> {
        for name in names {
            if !self.playlists.iter().any(|p| &p.name == name) {
                log::warn!("Playlist not found: {}", name);
            }
        }

        let mut seen = HashSet::new();
        let mut tracks = Vec::new();
        for playlist in self.playlists.iter().filter(|p| names.contains(&p.name)) {
            log::info!("Including playlist: {} ({} tracks)", playlist.name, playlist.len());
            for track_id in playlist.track_ids() {
                if !seen.insert(track_id) {
                    continue;
                }
                match self.tracks.get(track_id) {
                    Some(track) => tracks.push(track),
                    None => log::debug!("Playlist entry without track: {}", track_id),
                }
            }
        }
        tracks
    }
}
