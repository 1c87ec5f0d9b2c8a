//! Picks the MusicBrainz ID a track is submitted under

use crate::lookup::IdentifierLookup;
use crate::model::{Generator, Track};

/// Library-cached MBID first, online lookup second
///
/// Lookup failures are logged and count as "nothing found".
pub fn resolve_mbid(track: &Track, lookup: &dyn IdentifierLookup) -> Option<String> {
    let known = track.track_ids_of(&Generator::MusicBrainzTrack);
    if let Some(first) = known.first() {
        if known.len() > 1 {
            log::warn!(
                "Track {}. Found multiple MBIDs: {:?}",
                track.display_name(),
                known
            );
        } else {
            log::debug!("Track {}. Found MBID {}", track.display_name(), first);
        }
        return Some(first.clone());
    }

    match lookup.lookup(track) {
        Ok(matches) => matches
            .iter()
            .flat_map(|m| m.track_ids_of(&Generator::MusicBrainzTrack))
            .next(),
        Err(e) => {
            log::error!("Failed to look up MBID for {}: {:#}", track.display_name(), e);
            None
        }
    }
}
