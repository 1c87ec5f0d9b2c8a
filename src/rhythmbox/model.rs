//! Internal Rhythmbox data structures for XML parsing

use std::path::PathBuf;

/// Rhythmbox song entry (as stored in rhythmdb.xml)
#[derive(Debug, Clone, Default)]
pub struct RhythmboxEntry {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<u32>, // seconds
    pub location: Option<String>, // file:// URI
    pub mb_trackid: Option<String>,
}

impl RhythmboxEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_path(&self) -> Option<PathBuf> {
        self.location.as_deref().and_then(uri_to_path)
    }
}

/// Convert a file:// URI to a local path, decoding percent escapes
pub fn uri_to_path(uri: &str) -> Option<PathBuf> {
    uri.strip_prefix("file://")
        .and_then(|path| urlencoding::decode(path).ok())
        .map(|decoded| PathBuf::from(decoded.into_owned()))
}
