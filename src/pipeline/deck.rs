//! Deck resolution: turn an upload, local path or URL into PDF bytes.
//!
//! Every failure here is a [`DeckWarning`], never a fatal error: a missing or
//! oversized deck downgrades the request to "written inputs only". The size
//! bound is checked before the payload is read whenever the size is known up
//! front (file metadata, `Content-Length`), and again on the bytes.

use crate::error::DeckWarning;
use std::path::PathBuf;
use tracing::{debug, info};

/// Where the pitch deck comes from.
#[derive(Debug, Clone)]
pub enum DeckSource {
    /// Uploaded bytes, with the original file name.
    Bytes { name: String, bytes: Vec<u8> },
    /// A local file.
    Path(PathBuf),
    /// An HTTP/HTTPS URL.
    Url(String),
}

impl DeckSource {
    /// Interpret a user-supplied string as a URL or a local path.
    pub fn parse(input: &str) -> Self {
        if is_url(input) {
            DeckSource::Url(input.to_string())
        } else {
            DeckSource::Path(PathBuf::from(input))
        }
    }

    /// Display name used in warnings and logs.
    pub fn name(&self) -> String {
        match self {
            DeckSource::Bytes { name, .. } => name.clone(),
            DeckSource::Path(p) => p.display().to_string(),
            DeckSource::Url(u) => u.clone(),
        }
    }
}

/// A deck that passed the size and magic checks.
#[derive(Debug, Clone)]
pub struct DeckPayload {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `source` into PDF bytes no larger than `max_bytes`.
pub async fn load_deck(
    source: DeckSource,
    max_bytes: u64,
    timeout_secs: u64,
) -> Result<DeckPayload, DeckWarning> {
    let payload = match source {
        DeckSource::Bytes { name, bytes } => {
            check_size(bytes.len() as u64, max_bytes)?;
            DeckPayload { name, bytes }
        }
        DeckSource::Path(path) => load_local(path, max_bytes).await?,
        DeckSource::Url(url) => download_url(&url, max_bytes, timeout_secs).await?,
    };

    check_magic(&payload)?;
    debug!("Deck '{}' accepted: {} bytes", payload.name, payload.bytes.len());
    Ok(payload)
}

fn check_size(size_bytes: u64, limit_bytes: u64) -> Result<(), DeckWarning> {
    if size_bytes > limit_bytes {
        return Err(DeckWarning::TooLarge {
            size_bytes,
            limit_bytes,
        });
    }
    Ok(())
}

fn check_magic(payload: &DeckPayload) -> Result<(), DeckWarning> {
    if !payload.bytes.starts_with(b"%PDF") {
        return Err(DeckWarning::NotAPdf {
            name: payload.name.clone(),
            magic: payload.bytes.iter().take(4).copied().collect(),
        });
    }
    Ok(())
}

async fn load_local(path: PathBuf, max_bytes: u64) -> Result<DeckPayload, DeckWarning> {
    let meta = match tokio::fs::metadata(&path).await {
        Ok(m) if m.is_file() => m,
        _ => return Err(DeckWarning::NotFound { path }),
    };
    check_size(meta.len(), max_bytes)?;

    let bytes = tokio::fs::read(&path).await.map_err(|e| DeckWarning::Unreadable {
        name: path.display().to_string(),
        detail: e.to_string(),
    })?;
    check_size(bytes.len() as u64, max_bytes)?;

    Ok(DeckPayload {
        name: path.display().to_string(),
        bytes,
    })
}

async fn download_url(
    url: &str,
    max_bytes: u64,
    timeout_secs: u64,
) -> Result<DeckPayload, DeckWarning> {
    info!("Downloading pitch deck from: {}", url);
    let failed = |reason: String| DeckWarning::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let mut response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            failed(format!("timed out after {timeout_secs}s"))
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    if let Some(len) = response.content_length() {
        check_size(len, max_bytes)?;
    }

    // Content-Length may be absent or wrong; bound the body as it streams.
    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|e| failed(e.to_string()))? {
        check_size((bytes.len() + chunk.len()) as u64, max_bytes)?;
        bytes.extend_from_slice(&chunk);
    }
    debug!("Downloaded {} bytes", bytes.len());

    Ok(DeckPayload {
        name: extract_filename(url),
        bytes,
    })
}

/// Extract a reasonable filename from the URL path.
fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }
    "deck.pdf".to_string()
}
