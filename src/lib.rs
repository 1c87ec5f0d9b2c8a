//! abz-submit - AcousticBrainz submitter
//!
//! Runs the AcousticBrainz feature extractor over a music library and
//! submits the results, one track at a time.

pub mod lifecycle;
pub mod lookup;
pub mod model;
pub mod rhythmbox;
pub mod submit;
pub mod tags;

pub use submit::{SubmitConfig, SubmitPipeline};
