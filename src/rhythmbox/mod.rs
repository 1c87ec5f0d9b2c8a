//! Rhythmbox library parsing
//!
//! Reads Rhythmbox's XML database and playlist files into a [`Library`].
//! The `mb-trackid` Rhythmbox caches per entry becomes the track's
//! host-side MusicBrainz identifier; it is not necessarily embedded in the
//! audio file itself.

mod database;
mod model;
mod playlists;

pub use database::parse_database;
pub use playlists::parse_playlists;

use crate::model::Library;
use anyhow::Result;
use std::path::Path;

/// Parse a complete Rhythmbox library from its XML files
///
/// A missing playlists file is not an error; the library just has no
/// playlists.
pub fn parse_library(db_path: &Path, playlists_path: &Path) -> Result<Library> {
    log::info!("Parsing Rhythmbox database from {:?}", db_path);
    let tracks = database::parse_database(db_path)?;

    let playlists = if playlists_path.exists() {
        log::info!("Parsing Rhythmbox playlists from {:?}", playlists_path);
        playlists::parse_playlists(playlists_path, &tracks)?
    } else {
        log::debug!("No playlists file at {:?}", playlists_path);
        Vec::new()
    };

    let mut library = Library::new();
    for track in tracks {
        library.add_track(track);
    }
    for playlist in playlists {
        library.add_playlist(playlist);
    }

    log::info!(
        "Loaded library: {} tracks, {} playlists",
        library.track_count(),
        library.playlist_count()
    );

    Ok(library)
}
