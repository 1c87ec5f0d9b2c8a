use serde::{Deserialize, Serialize};

/// A named, ordered selection of library tracks
///
/// Only static playlists are represented; smart playlists have no fixed
/// membership to submit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Playlist {
    pub name: String,
    track_ids: Vec<String>,
}

impl Playlist {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            track_ids: Vec::new(),
        }
    }

    /// Append a member by [`Track::id`](super::Track::id)
    pub fn push(&mut self, track_id: impl Into<String>) {
        self.track_ids.push(track_id.into());
    }

    /// Member IDs in playlist order
    pub fn track_ids(&self) -> impl Iterator<Item = &str> {
        self.track_ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.track_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.track_ids.is_empty()
    }
}
