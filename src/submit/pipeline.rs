//! One track, one submission
//!
//! ```text
//! eligible? -> resolve MBID -> prepare input -> extract -> reconcile -> submit
//! ```
//!
//! Every step after the eligibility check may fail; all failures end up as
//! exactly one user-visible [`Message`]. Progress reaches 1.0 and every
//! scratch file is removed however the run ends.

use super::client::{SubmissionOutcome, Submitter};
use super::config::SubmitConfig;
use super::error::SubmitResult;
use super::extractor::ExtractorHome;
use super::reconcile::reconcile_mbid;
use super::resolver::resolve_mbid;
use super::scratch::prepare_input;
use super::workfiles::WorkingFiles;
use crate::lookup::IdentifierLookup;
use crate::model::Track;
use crate::tags::TagStore;
use std::sync::{Arc, Mutex};

/// Receives fractional progress (0.0..=1.0) for the current run
pub trait ProgressListener: Send + Sync {
    fn progress(&self, fraction: f32);
}

/// Ignores progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressListener for NoProgress {
    fn progress(&self, _fraction: f32) {}
}

/// A message meant for the user, tied to the track it concerns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub track_id: String,
    pub text: String,
}

/// Where user-visible messages go
pub trait MessageSink: Send + Sync {
    fn add_message(&self, message: Message);
}

/// Collects messages in memory
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Mutex<Vec<Message>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

impl MessageSink for MessageLog {
    fn add_message(&self, message: Message) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message);
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Not eligible; nothing was touched
    Skipped,

    /// Accepted by the server under this MBID
    Submitted { mbid: String },

    /// A message with this text was sent to the sink
    Failed { message: String },
}

/// Reports 1.0 when dropped
struct FinishProgress<'a>(&'a dyn ProgressListener);

impl Drop for FinishProgress<'_> {
    fn drop(&mut self) {
        self.0.progress(1.0);
    }
}

/// AcousticBrainz submission for single tracks
///
/// Cheap to share between worker threads; each [`SubmitPipeline::run`]
/// owns its own scratch files.
pub struct SubmitPipeline {
    config: SubmitConfig,
    extractor: Arc<ExtractorHome>,
    submitter: Submitter,
    lookup: Arc<dyn IdentifierLookup>,
    tags: Arc<dyn TagStore>,
    messages: Arc<dyn MessageSink>,
}

impl SubmitPipeline {
    pub fn new(
        config: SubmitConfig,
        extractor: Arc<ExtractorHome>,
        lookup: Arc<dyn IdentifierLookup>,
        tags: Arc<dyn TagStore>,
        messages: Arc<dyn MessageSink>,
    ) -> Self {
        let submitter = Submitter::new(&config);
        Self {
            config,
            extractor,
            submitter,
            lookup,
            tags,
            messages,
        }
    }

    /// Run the full pipeline for `track`
    pub fn run(&self, track: &Track, progress: &dyn ProgressListener) -> RunOutcome {
        // Over-long tracks crash the extractor or yield meaningless averages.
        if track.duration_ms >= self.config.max_duration_ms {
            log::debug!("Skipping track, because it is too long: {}", track.display_name());
            return RunOutcome::Skipped;
        }

        let mut files = WorkingFiles::new();
        let _finish = FinishProgress(progress);

        if !track.file_path.is_file() {
            return self.fail(
                track,
                format!(
                    "Failed to submit '{}' to AcousticBrainz. File not found.",
                    track.display_name()
                ),
            );
        }

        match self.process(track, progress, &mut files) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("Submission of {:?} failed: {}", track.file_path, e);
                self.fail(
                    track,
                    format!(
                        "Failed to submit '{}' to AcousticBrainz: {}",
                        track.display_name(),
                        e
                    ),
                )
            }
        }
    }

    fn process(
        &self,
        track: &Track,
        progress: &dyn ProgressListener,
        files: &mut WorkingFiles,
    ) -> SubmitResult<RunOutcome> {
        let Some(mbid) = resolve_mbid(track, self.lookup.as_ref()) else {
            return Ok(self.fail(
                track,
                format!(
                    "Failed to submit '{}' to AcousticBrainz. Unable to find MusicBrainz ID.",
                    track.display_name()
                ),
            ));
        };
        progress.progress(0.25);

        let input = prepare_input(track, &mbid, self.tags.as_ref(), files)?;
        progress.progress(0.4);

        let run = self.extractor.run(&input.path, files)?;
        progress.progress(0.5);

        if !run.success() {
            log::error!(
                "Failed to analyze/submit {}. Input file: {:?}. Exit code: {}. Output: {}",
                track.display_name(),
                input.path,
                run.exit_code,
                run.console
            );
            return Ok(self.fail(
                track,
                format!(
                    "Failed to submit '{}' to AcousticBrainz. Exit code {}. See log for details.",
                    track.display_name(),
                    run.exit_code
                ),
            ));
        }

        let used_mbid = reconcile_mbid(&mbid, &run.output_path)?;

        match self.submitter.submit(&used_mbid, &run.output_path)? {
            SubmissionOutcome::Accepted { status } => {
                log::info!(
                    "Submitted {} as {} (HTTP {})",
                    track.display_name(),
                    used_mbid,
                    status
                );
                Ok(RunOutcome::Submitted { mbid: used_mbid })
            }
            SubmissionOutcome::Rejected {
                status,
                status_text,
                message,
            } => Ok(self.fail(
                track,
                format!(
                    "Failed to submit '{}' to AcousticBrainz. {}: {}. {}",
                    track.display_name(),
                    status,
                    status_text,
                    message
                ),
            )),
        }
    }

    fn fail(&self, track: &Track, text: String) -> RunOutcome {
        self.messages.add_message(Message {
            track_id: track.id.clone(),
            text: text.clone(),
        });
        RunOutcome::Failed { message: text }
    }
}
