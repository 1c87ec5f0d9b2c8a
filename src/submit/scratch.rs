//! Input preparation: the extractor must see the MBID inside the file

use super::error::{SubmitError, SubmitResult};
use super::workfiles::WorkingFiles;
use crate::model::Track;
use crate::tags::TagStore;
use std::fs;
use std::path::{Path, PathBuf};

/// The file handed to the extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedInput {
    pub path: PathBuf,

    /// `true` when `path` is a scratch copy owned by the run
    pub is_temporary: bool,
}

/// Use the original file if it already embeds an MBID, otherwise a tagged copy
///
/// The original file is never written to. A copy is registered with
/// `files` before anything is written into it.
pub fn prepare_input(
    track: &Track,
    mbid: &str,
    tags: &dyn TagStore,
    files: &mut WorkingFiles,
) -> SubmitResult<PreparedInput> {
    let embedded = tags
        .embedded_track_ids(&track.file_path)
        .map_err(SubmitError::Tag)?;

    if !embedded.is_empty() {
        return Ok(PreparedInput {
            path: std::path::absolute(&track.file_path)?,
            is_temporary: false,
        });
    }

    log::info!(
        "Track {}. MBID is not embedded. Embedding {} into copy. Consider embedding MBIDs before submitting.",
        track.display_name(),
        mbid
    );

    let copy = scratch_copy_path(&track.file_path)?;
    files.register(copy.clone());
    fs::copy(&track.file_path, &copy)?;
    tags.embed_track_id(&copy, mbid).map_err(SubmitError::Tag)?;

    Ok(PreparedInput {
        path: copy,
        is_temporary: true,
    })
}

/// Reserve a unique temp path that keeps the source's extension
///
/// Tag libraries pick the container format from the extension.
fn scratch_copy_path(source: &Path) -> SubmitResult<PathBuf> {
    let suffix = source
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    let path = tempfile::Builder::new()
        .prefix("copy")
        .suffix(&suffix)
        .tempfile()?
        .into_temp_path()
        .keep()
        .map_err(|e| SubmitError::Io(e.error))?;
    Ok(path)
}
