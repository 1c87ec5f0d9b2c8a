//! Online identifier lookup
//!
//! When neither the library nor the file knows a track's MusicBrainz ID,
//! the pipeline asks an [`IdentifierLookup`] for candidate matches.

use crate::model::{AudioId, Track};
use anyhow::{Context, Result};
use governor::clock::{Clock, DefaultClock};
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::time::Duration;

/// MusicBrainz web service root
pub const MUSICBRAINZ_API_URL: &str = "https://musicbrainz.org/ws/2";

/// Lowest search score accepted as a match
const MIN_SCORE: u32 = 90;

/// Resolves a track to zero or more matching tracks that carry identifiers
pub trait IdentifierLookup: Send + Sync {
    fn lookup(&self, track: &Track) -> Result<Vec<Track>>;
}

/// Lookup that never finds anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLookup;

impl IdentifierLookup for NoLookup {
    fn lookup(&self, _track: &Track) -> Result<Vec<Track>> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Deserialize)]
struct RecordingSearch {
    #[serde(default)]
    recordings: Vec<Recording>,
}

#[derive(Debug, Deserialize)]
struct Recording {
    id: String,
    #[serde(default)]
    score: u32,
    #[serde(default)]
    title: String,
    #[serde(default)]
    length: Option<u32>,
}

/// Recording search against the MusicBrainz web service
///
/// MusicBrainz allows one request per second per client; the limiter is
/// shared by every worker using this lookup.
pub struct MusicBrainzLookup {
    http_client: ureq::Agent,
    api_url: String,
    user_agent: String,
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    clock: DefaultClock,
}

impl MusicBrainzLookup {
    pub fn new(user_agent: impl Into<String>) -> Self {
        let http_client = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(15))
            .build();

        Self {
            http_client,
            api_url: MUSICBRAINZ_API_URL.to_string(),
            user_agent: user_agent.into(),
            limiter: RateLimiter::direct(Quota::per_second(NonZeroU32::MIN)),
            clock: DefaultClock::default(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    fn search_url(&self, track: &Track) -> String {
        let query = format!(
            "recording:\"{}\" AND artist:\"{}\"",
            escape_lucene(&track.title),
            escape_lucene(&track.artist)
        );
        format!(
            "{}/recording?query={}&fmt=json&limit=5",
            self.api_url,
            urlencoding::encode(&query)
        )
    }

    fn wait_for_slot(&self) {
        while let Err(not_until) = self.limiter.check() {
            std::thread::sleep(not_until.wait_time_from(self.clock.now()));
        }
    }
}

impl IdentifierLookup for MusicBrainzLookup {
    fn lookup(&self, track: &Track) -> Result<Vec<Track>> {
        self.wait_for_slot();

        let url = self.search_url(track);
        log::debug!("MusicBrainz lookup: {}", url);

        let search: RecordingSearch = self
            .http_client
            .get(&url)
            .set("User-Agent", &self.user_agent)
            .set("Accept", "application/json")
            .call()
            .context("MusicBrainz request failed")?
            .into_json()
            .context("MusicBrainz response parse failed")?;

        let matches: Vec<Track> = search
            .recordings
            .into_iter()
            .filter(|r| r.score >= MIN_SCORE)
            .map(|r| Track {
                id: r.id.clone(),
                title: r.title,
                artist: track.artist.clone(),
                album: track.album.clone(),
                duration_ms: r.length.unwrap_or(0),
                file_path: track.file_path.clone(),
                track_ids: vec![AudioId::musicbrainz(r.id)],
            })
            .collect();

        log::debug!("MusicBrainz lookup for '{}': {} match(es)", track.title, matches.len());
        Ok(matches)
    }
}

/// Escape Lucene query syntax inside a quoted phrase
fn escape_lucene(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn track() -> Track {
        Track {
            id: "t".to_string(),
            title: "Say \"Hi\"".to_string(),
            artist: "Band".to_string(),
            album: "Album".to_string(),
            duration_ms: 200_000,
            file_path: PathBuf::from("/music/hi.flac"),
            track_ids: Vec::new(),
        }
    }

    #[test]
    fn test_no_lookup_finds_nothing() {
        assert!(NoLookup.lookup(&track()).unwrap().is_empty());
    }

    #[test]
    fn test_search_url_is_encoded() {
        let lookup = MusicBrainzLookup::new("test/1.0").with_api_url("http://mb.local/ws/2/");
        let url = lookup.search_url(&track());
        assert!(url.starts_with("http://mb.local/ws/2/recording?query="));
        assert!(url.ends_with("&fmt=json&limit=5"));
        assert!(!url.contains(' '));
        assert!(url.contains(&*urlencoding::encode("\\\"Hi\\\"")));
    }

    #[test]
    fn test_recording_search_deserializes_partial_payload() {
        let body = r#"{"created":"x","count":2,"recordings":[
            {"id":"abc123","score":100,"title":"Hi","length":200000},
            {"id":"def456","score":40}
        ]}"#;
        let search: RecordingSearch = serde_json::from_str(body).unwrap();
        assert_eq!(search.recordings.len(), 2);
        assert_eq!(search.recordings[0].length, Some(200_000));
        assert_eq!(search.recordings[1].title, "");
    }
}
