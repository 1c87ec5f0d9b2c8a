//! Test doubles shared by the submission unit tests

use crate::model::Track;
use crate::tags::TagStore;
use anyhow::Result;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread::JoinHandle;

/// In-memory [`TagStore`]: embedded IDs per path, records every write
#[derive(Default)]
pub struct FakeTags {
    pub embedded: Vec<(PathBuf, String)>,
    pub written: Mutex<Vec<(PathBuf, String)>>,
    pub fail_embed: bool,
}

impl TagStore for FakeTags {
    fn embedded_track_ids(&self, path: &Path) -> Result<Vec<String>> {
        let written = self.written.lock().unwrap();
        Ok(self
            .embedded
            .iter()
            .chain(written.iter())
            .filter(|(p, _)| p == path)
            .map(|(_, id)| id.clone())
            .collect())
    }

    fn embed_track_id(&self, path: &Path, mbid: &str) -> Result<()> {
        if self.fail_embed {
            anyhow::bail!("read-only tag");
        }
        self.written
            .lock()
            .unwrap()
            .push((path.to_path_buf(), mbid.to_string()));
        Ok(())
    }
}

pub fn track_at(path: PathBuf, duration_ms: u32) -> Track {
    Track {
        id: "t1".to_string(),
        title: "Song".to_string(),
        artist: "Artist".to_string(),
        album: "Album".to_string(),
        duration_ms,
        file_path: path,
        track_ids: Vec::new(),
    }
}

/// One-shot HTTP responder on 127.0.0.1
///
/// Accepts a single connection, captures the raw request (headers and
/// chunked body) and answers with the canned status and body.
pub struct OneShotServer {
    pub url: String,
    handle: JoinHandle<Vec<u8>>,
}

impl OneShotServer {
    pub fn start(status_line: &str, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );

        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 8192];
            loop {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
            request
        });

        Self { url, handle }
    }

    /// Raw request bytes as received
    pub fn request(self) -> Vec<u8> {
        self.handle.join().unwrap()
    }
}

fn request_complete(request: &[u8]) -> bool {
    let Some(header_end) = find(request, b"\r\n\r\n") else {
        return false;
    };
    let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
    if headers.contains("transfer-encoding: chunked") {
        return request.ends_with(b"0\r\n\r\n");
    }
    let length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    request.len() >= header_end + 4 + length
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Split a captured request into lowercase header text and decoded body
pub fn split_request(request: &[u8]) -> (String, Vec<u8>) {
    let header_end = find(request, b"\r\n\r\n").unwrap();
    let headers = String::from_utf8_lossy(&request[..header_end]).to_string();
    let raw_body = &request[header_end + 4..];
    let body = if headers.to_lowercase().contains("transfer-encoding: chunked") {
        dechunk(raw_body)
    } else {
        raw_body.to_vec()
    };
    (headers, body)
}

fn dechunk(mut raw: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    while let Some(line_end) = find(raw, b"\r\n") {
        let size_text = String::from_utf8_lossy(&raw[..line_end]).to_string();
        let size = usize::from_str_radix(size_text.split(';').next().unwrap().trim(), 16).unwrap();
        if size == 0 {
            break;
        }
        let start = line_end + 2;
        body.extend_from_slice(&raw[start..start + size]);
        raw = &raw[start + size + 2..];
    }
    body
}
