//! Host library data model
//!
//! Tracks, their external identifiers and the playlists that group them.
//! The submission pipeline only ever reads from these types.

mod library;
mod playlist;
mod track;

pub use library::Library;
pub use playlist::Playlist;
pub use track::{AudioId, Generator, Track};
