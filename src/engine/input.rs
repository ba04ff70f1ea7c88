//! Input resolution: normalise a user-supplied path, URL or buffer into an
//! [`InputFile`].
//!
//! Both engines work on the file's bytes, so URLs are downloaded straight into
//! memory. The file kind is sniffed from magic bytes rather than trusted from
//! the extension; anything that is neither a PDF nor a supported image is
//! rejected here with a meaningful error before an engine ever sees it.

use crate::error::OcrLangError;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, info};

/// Formats the toolkit's OCR flow accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Png,
    Jpeg,
    Gif,
    Webp,
    Tiff,
    Bmp,
}

impl FileKind {
    /// Identify a file from its leading bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [b'%', b'P', b'D', b'F', ..] => Some(Self::Pdf),
            [0x89, b'P', b'N', b'G', ..] => Some(Self::Png),
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            [b'G', b'I', b'F', b'8', ..] => Some(Self::Gif),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(Self::Webp),
            [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => Some(Self::Tiff),
            [b'B', b'M', ..] => Some(Self::Bmp),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
            Self::Tiff => "image/tiff",
            Self::Bmp => "image/bmp",
        }
    }

    pub fn is_image(self) -> bool {
        !matches!(self, Self::Pdf)
    }
}

/// A file ready to hand to an engine.
#[derive(Debug, Clone)]
pub struct InputFile {
    name: String,
    kind: FileKind,
    bytes: Vec<u8>,
}

impl InputFile {
    /// Wrap an in-memory buffer, sniffing its format.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, OcrLangError> {
        let name = name.into();
        let kind = FileKind::sniff(&bytes).ok_or_else(|| OcrLangError::UnsupportedFormat {
            name: name.clone(),
            magic: bytes.iter().take(4).copied().collect(),
        })?;
        Ok(Self { name, kind, bytes })
    }

    /// File name (last path or URL segment).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hex SHA-256 of the contents, used as the detection cache key.
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a path or HTTP(S) URL into an [`InputFile`].
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<InputFile, OcrLangError> {
    if input.trim().is_empty() {
        return Err(OcrLangError::invalid_input("empty input path"));
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(Path::new(input)).await
    }
}

async fn resolve_local(path: &Path) -> Result<InputFile, OcrLangError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(OcrLangError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(OcrLangError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    debug!("Resolved local file: {} ({} bytes)", path.display(), bytes.len());
    InputFile::from_bytes(name, bytes)
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<InputFile, OcrLangError> {
    info!("Downloading input from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| OcrLangError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            OcrLangError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            OcrLangError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(OcrLangError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| OcrLangError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());
    InputFile::from_bytes(filename_from_url(url), bytes.to_vec())
}

/// Last non-empty path segment of `url`, or a generic name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() {
                    return last.to_string();
                }
            }
        }
    }
    "download".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/scan.png"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/scan.png"));
        assert!(!is_url(""));
    }

    #[test]
    fn sniff_known_formats() {
        assert_eq!(FileKind::sniff(b"%PDF-1.7"), Some(FileKind::Pdf));
        assert_eq!(FileKind::sniff(PNG_MAGIC), Some(FileKind::Png));
        assert_eq!(FileKind::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(FileKind::Jpeg));
        assert_eq!(FileKind::sniff(b"RIFF\0\0\0\0WEBPVP8 "), Some(FileKind::Webp));
        assert_eq!(FileKind::sniff(b"II*\0"), Some(FileKind::Tiff));
        assert_eq!(FileKind::sniff(b"PK\x03\x04"), None);
        assert_eq!(FileKind::sniff(b""), None);
    }

    #[test]
    fn from_bytes_rejects_unknown_format() {
        let err = InputFile::from_bytes("notes.zip", b"PK\x03\x04rest".to_vec()).unwrap_err();
        assert!(matches!(err, OcrLangError::UnsupportedFormat { .. }));
        assert!(err.to_string().contains("notes.zip"));
    }

    #[test]
    fn fingerprint_depends_on_content_only() {
        let a = InputFile::from_bytes("a.png", PNG_MAGIC.to_vec()).unwrap();
        let b = InputFile::from_bytes("b.png", PNG_MAGIC.to_vec()).unwrap();
        let c = InputFile::from_bytes("c.pdf", b"%PDF-1.4".to_vec()).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn filename_from_url_uses_last_segment() {
        assert_eq!(filename_from_url("https://x.org/a/scan.jpg"), "scan.jpg");
        assert_eq!(filename_from_url("https://x.org/"), "download");
    }

    #[tokio::test]
    async fn resolve_local_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"%PDF-1.5 body").unwrap();
        let file = resolve_input(tmp.path().to_str().unwrap(), 5).await.unwrap();
        assert_eq!(file.kind(), FileKind::Pdf);
        assert!(!file.kind().is_image());
    }

    #[tokio::test]
    async fn resolve_missing_file() {
        let err = resolve_input("/definitely/not/here.png", 5).await.unwrap_err();
        assert!(matches!(err, OcrLangError::FileNotFound { .. }));
    }
}
