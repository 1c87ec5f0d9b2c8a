//! AcousticBrainz low-level submission

use super::config::{PayloadEncoding, SubmitConfig};
use super::error::SubmitResult;
use flate2::read::GzEncoder;
use flate2::Compression;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// What the server made of a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// 200 or 201
    Accepted { status: u16 },

    /// Any other HTTP status
    Rejected {
        status: u16,
        status_text: String,
        /// `message` from a JSON error body, otherwise the raw body
        message: String,
    },
}

/// Blocking client for `POST /api/v1/<mbid>/low-level`
pub struct Submitter {
    http_client: ureq::Agent,
    api_url: String,
    user_agent: String,
    payload_encoding: PayloadEncoding,
    error_body_limit: u64,
}

impl Submitter {
    pub fn new(config: &SubmitConfig) -> Self {
        let http_client = ureq::AgentBuilder::new()
            .timeout_connect(config.connect_timeout)
            .timeout_read(config.read_timeout)
            .build();

        Self {
            http_client,
            api_url: config.api_url.clone(),
            user_agent: config.user_agent.clone(),
            payload_encoding: config.payload_encoding,
            error_body_limit: config.error_body_limit,
        }
    }

    pub fn endpoint(&self, mbid: &str) -> String {
        format!("{}/api/v1/{}/low-level", self.api_url, mbid.to_lowercase())
    }

    /// Stream `document` to the server
    ///
    /// HTTP-level rejections are an `Ok` outcome; only I/O and transport
    /// failures are errors.
    pub fn submit(&self, mbid: &str, document: &Path) -> SubmitResult<SubmissionOutcome> {
        let url = self.endpoint(mbid);
        log::debug!("Posting to {}", url);

        let request = self
            .http_client
            .post(&url)
            .set("User-Agent", &self.user_agent)
            .set("Content-Type", "application/json")
            .set("Content-Encoding", "gzip");

        let body = BufReader::new(File::open(document)?);
        let result = match self.payload_encoding {
            PayloadEncoding::Declared => request.send(body),
            PayloadEncoding::Gzip => request.send(GzEncoder::new(body, Compression::default())),
        };

        match result {
            Ok(response) => Ok(classify(response, self.error_body_limit)?),
            Err(ureq::Error::Status(_, response)) => Ok(classify(response, self.error_body_limit)?),
            Err(ureq::Error::Transport(transport)) => Err(Box::new(transport).into()),
        }
    }
}

fn classify(response: ureq::Response, limit: u64) -> std::io::Result<SubmissionOutcome> {
    let status = response.status();
    if status == 200 || status == 201 {
        return Ok(SubmissionOutcome::Accepted { status });
    }

    let status_text = response.status_text().to_string();
    let mut raw = Vec::new();
    response.into_reader().take(limit).read_to_end(&mut raw)?;
    let raw = String::from_utf8_lossy(&raw).into_owned();
    log::error!("AcousticBrainz rejected submission ({} {}): {}", status, status_text, raw);

    Ok(SubmissionOutcome::Rejected {
        status,
        status_text,
        message: error_message(&raw),
    })
}

/// `message` of a JSON error body, or the body itself
fn error_message(raw: &str) -> String {
    serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|json| json.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| raw.to_string())
}
