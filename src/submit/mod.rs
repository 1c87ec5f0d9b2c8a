//! AcousticBrainz submission pipeline
//!
//! Runs the Essentia streaming extractor on a track and posts the
//! resulting low-level document to AcousticBrainz under the track's
//! MusicBrainz ID.

pub mod client;
pub mod config;
pub mod error;
pub mod extractor;
pub mod pipeline;
pub mod reconcile;
pub mod resolver;
pub mod scratch;
pub mod workfiles;

#[cfg(test)]
mod testing;

pub use client::{SubmissionOutcome, Submitter};
pub use config::{ExtractorConfig, PayloadEncoding, SubmitConfig};
pub use error::{SubmitError, SubmitResult};
pub use extractor::{ExtractorHome, ExtractorRun};
pub use pipeline::{
    Message, MessageLog, MessageSink, NoProgress, ProgressListener, RunOutcome, SubmitPipeline,
};
