//! Reading back the MBID the extractor recorded

use super::error::{SubmitError, SubmitResult};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Pick the MBID to submit under
///
/// The extractor copies the file's `musicbrainz_trackid` tag into
/// `metadata.tags`. If that value is present it wins over `candidate`,
/// since it is what the document actually describes.
pub fn reconcile_mbid(candidate: &str, output_path: &Path) -> SubmitResult<String> {
    let file = File::open(output_path)?;
    let document: Value = serde_json::from_reader(BufReader::new(file))?;
    let extracted = extracted_mbid(&document)?;

    match extracted {
        Some(extracted) if !extracted.eq_ignore_ascii_case(candidate) => {
            log::info!("Replaced originally found MBID {} with {}", candidate, extracted);
            Ok(extracted)
        }
        _ => Ok(candidate.to_string()),
    }
}

/// First `metadata.tags.musicbrainz_trackid` entry, lowercased
fn extracted_mbid(document: &Value) -> SubmitResult<Option<String>> {
    let tags = document
        .get("metadata")
        .and_then(Value::as_object)
        .ok_or_else(|| SubmitError::MalformedOutput("missing \"metadata\" object".to_string()))?
        .get("tags")
        .and_then(Value::as_object)
        .ok_or_else(|| SubmitError::MalformedOutput("missing \"metadata.tags\" object".to_string()))?;

    let Some(ids) = tags.get("musicbrainz_trackid") else {
        return Ok(None);
    };
    let ids = ids.as_array().ok_or_else(|| {
        SubmitError::MalformedOutput("\"musicbrainz_trackid\" is not an array".to_string())
    })?;

    match ids.first() {
        None => Ok(None),
        Some(Value::String(id)) => Ok(Some(id.to_lowercase())),
        Some(other) => Err(SubmitError::MalformedOutput(format!(
            "unexpected musicbrainz_trackid entry: {}",
            other
        ))),
    }
}
