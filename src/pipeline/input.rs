//! Input resolution: load a user-supplied path or URL as Markdown bytes.
//!
//! The bytes are returned undecoded; [`crate::pipeline::pages`] decodes each
//! page segment separately so one badly encoded page cannot sink the whole
//! document. We do check the PDF magic bytes (`%PDF`) up front: feeding a raw
//! PDF to the classifier would "work" and produce garbage rows, so callers get
//! a pointer to the conversion step instead.

use crate::error::DocflowError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Markdown input resolved to memory.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    /// File name (or last URL path segment) used as the default row label.
    pub name: String,
    /// Raw bytes of the Markdown document.
    pub bytes: Vec<u8>,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to Markdown bytes.
///
/// If the input is a URL, download it. If it is a local file, validate that
/// it exists, is readable and is not a raw PDF.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, DocflowError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else if input.trim().is_empty() {
        Err(DocflowError::InvalidInput {
            input: input.to_string(),
        })
    } else {
        resolve_local(input).await
    }
}

async fn resolve_local(path_str: &str) -> Result<ResolvedInput, DocflowError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(DocflowError::FileNotFound { path });
    }
    if path.is_dir() {
        return Err(DocflowError::InvalidInput {
            input: path_str.to_string(),
        });
    }

    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(DocflowError::PermissionDenied { path });
        }
        Err(_) => return Err(DocflowError::FileNotFound { path }),
    };

    if bytes.starts_with(PDF_MAGIC) {
        return Err(DocflowError::UnconvertedPdf { path });
    }

    debug!("Resolved local input: {} ({} bytes)", path.display(), bytes.len());
    Ok(ResolvedInput {
        name: file_label(&path),
        bytes,
    })
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, DocflowError> {
    info!("Downloading Markdown from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DocflowError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            DocflowError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            DocflowError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(DocflowError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| DocflowError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    if bytes.starts_with(PDF_MAGIC) {
        return Err(DocflowError::UnconvertedPdf {
            path: PathBuf::from(url_label(url)),
        });
    }

    info!("Downloaded {} bytes", bytes.len());
    Ok(ResolvedInput {
        name: url_label(url),
        bytes: bytes.to_vec(),
    })
}

/// File name component of `path`, falling back to the full path.
pub fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Last non-empty path segment of `url`, or a generic name.
fn url_label(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() {
                    return last.to_string();
                }
            }
        }
    }
    "downloaded.md".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.md"));
        assert!(is_url("http://example.com/doc.md"));
        assert!(!is_url("/tmp/doc.md"));
        assert!(!is_url("doc.md"));
        assert!(!is_url(""));
    }

    #[test]
    fn test_url_label() {
        assert_eq!(url_label("https://example.com/reports/esg-2023.md"), "esg-2023.md");
        assert_eq!(url_label("https://example.com/"), "downloaded.md");
    }

    #[test]
    fn test_file_label() {
        assert_eq!(file_label(Path::new("/data/in/report.md")), "report.md");
    }

    #[tokio::test]
    async fn test_resolve_local_reads_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        std::fs::write(&path, "# Title\n").unwrap();

        let resolved = resolve_input(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(resolved.name, "report.md");
        assert_eq!(resolved.bytes, b"# Title\n");
    }

    #[tokio::test]
    async fn test_resolve_missing_file() {
        let err = resolve_input("/definitely/not/here.md", 5).await.unwrap_err();
        assert!(matches!(err, DocflowError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_resolve_rejects_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.pdf");
        std::fs::write(&path, b"%PDF-1.7\n...").unwrap();

        let err = resolve_input(path.to_str().unwrap(), 5).await.unwrap_err();
        assert!(matches!(err, DocflowError::UnconvertedPdf { .. }));
    }

    #[tokio::test]
    async fn test_resolve_rejects_directory_and_blank() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_input(dir.path().to_str().unwrap(), 5).await.unwrap_err();
        assert!(matches!(err, DocflowError::InvalidInput { .. }));

        let err = resolve_input("  ", 5).await.unwrap_err();
        assert!(matches!(err, DocflowError::InvalidInput { .. }));
    }
}
