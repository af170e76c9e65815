//! Fetching catalog and document assets

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use thiserror::Error;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Errors raised while fetching an asset
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to fetch {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{0} points outside the site root")]
    OutsideRoot(String),
}

/// Source of text assets addressed by catalog paths
pub trait AssetSource: Send + Sync {
    /// Fetch an asset as text. Bytes that are not valid UTF-8 are replaced,
    /// never rejected.
    fn fetch_text(&self, file: &str) -> Result<String, FetchError>;

    /// Location handed to the system viewer for binary documents
    fn locate(&self, file: &str) -> Result<String, FetchError>;
}

/// Whether a catalog path names a remote resource
pub fn is_remote(file: &str) -> bool {
    let lower = file.to_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Assets laid out on disk below a site root, plus absolute `http(s)` URLs
#[derive(Debug)]
pub struct FsAssetSource {
    root: PathBuf,
    http: OnceLock<reqwest::blocking::Client>,
}

impl FsAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            http: OnceLock::new(),
        }
    }

    /// Resolve a catalog path against the site root. Leading `./` and `/`
    /// are both treated as root-relative; `..` is rejected.
    pub fn resolve(&self, file: &str) -> Result<PathBuf, FetchError> {
        let relative = file.trim_start_matches("./").trim_start_matches('/');
        let escapes = Path::new(relative)
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(FetchError::OutsideRoot(file.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn client(&self) -> Result<&reqwest::blocking::Client, reqwest::Error> {
        if let Some(client) = self.http.get() {
            return Ok(client);
        }
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(self.http.get_or_init(|| client))
    }

    fn fetch_remote(&self, url: &str) -> Result<String, FetchError> {
        let http_error = |source| FetchError::Http {
            url: url.to_string(),
            source,
        };

        let response = self
            .client()
            .and_then(|client| client.get(url).send())
            .and_then(|response| response.error_for_status())
            .map_err(http_error)?;
        // Decodes with the charset the server declares, replacing bad bytes
        response.text().map_err(http_error)
    }
}

impl AssetSource for FsAssetSource {
    fn fetch_text(&self, file: &str) -> Result<String, FetchError> {
        if is_remote(file) {
            return self.fetch_remote(file);
        }
        let path = self.resolve(file)?;
        let bytes = std::fs::read(&path).map_err(|source| FetchError::Io { path, source })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn locate(&self, file: &str) -> Result<String, FetchError> {
        if is_remote(file) {
            Ok(file.to_string())
        } else {
            Ok(self.resolve(file)?.to_string_lossy().to_string())
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Serve a single HTTP response on a loopback port and return its base URL
    pub(crate) fn serve_once(status: &'static str, body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let head = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/markdown; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(body).unwrap();
        });

        format!("http://{}", addr)
    }

    #[test]
    fn test_resolve_relative_paths() {
        let source = FsAssetSource::new("/srv/site");
        assert_eq!(
            source.resolve("docs/a.pdf").unwrap(),
            PathBuf::from("/srv/site/docs/a.pdf")
        );
        assert_eq!(
            source.resolve("./docs/a.pdf").unwrap(),
            PathBuf::from("/srv/site/docs/a.pdf")
        );
        assert_eq!(
            source.resolve("/docs/a.pdf").unwrap(),
            PathBuf::from("/srv/site/docs/a.pdf")
        );
    }

    #[test]
    fn test_parent_components_are_rejected() {
        let source = FsAssetSource::new("/srv/site");
        for file in ["../../x.md", "docs/../../x.md", "./../x.pdf", "/../x.md"] {
            assert!(
                matches!(source.resolve(file), Err(FetchError::OutsideRoot(_))),
                "{} should be rejected",
                file
            );
        }
        assert!(matches!(
            source.fetch_text("../secret.md"),
            Err(FetchError::OutsideRoot(_))
        ));
        assert!(source.locate("../a.pdf").is_err());
    }

    #[test]
    fn test_fetch_text_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("notes")).unwrap();
        std::fs::write(dir.path().join("notes/n.md"), "# Notes\n").unwrap();

        let source = FsAssetSource::new(dir.path());
        assert_eq!(source.fetch_text("notes/n.md").unwrap(), "# Notes\n");
    }

    #[test]
    fn test_non_utf8_text_is_decoded_lossily() {
        let dir = tempfile::tempdir().unwrap();
        // "# 标题" in GBK
        std::fs::write(dir.path().join("g.md"), b"# \xb1\xea\xcc\xe2\n").unwrap();

        let source = FsAssetSource::new(dir.path());
        let text = source.fetch_text("g.md").unwrap();
        assert!(text.starts_with("# "));
        assert!(text.contains('\u{FFFD}'));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsAssetSource::new(dir.path());
        match source.fetch_text("missing.md") {
            Err(FetchError::Io { path, .. }) => assert!(path.ends_with("missing.md")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_fetch_remote_text() {
        let base = serve_once("200 OK", "# 远程笔记\n".as_bytes());
        let source = FsAssetSource::new("/srv/site");
        assert_eq!(
            source.fetch_text(&format!("{}/notes.md", base)).unwrap(),
            "# 远程笔记\n"
        );
    }

    #[test]
    fn test_remote_error_status_is_http_error() {
        let base = serve_once("404 Not Found", b"missing");
        let source = FsAssetSource::new("/srv/site");
        assert!(matches!(
            source.fetch_text(&format!("{}/gone.md", base)),
            Err(FetchError::Http { .. })
        ));
    }

    #[test]
    fn test_locate() {
        let source = FsAssetSource::new("/srv/site");
        assert_eq!(
            source.locate("HTTPS://example.com/a.pdf").unwrap(),
            "HTTPS://example.com/a.pdf"
        );
        assert_eq!(source.locate("a.pdf").unwrap(), "/srv/site/a.pdf");
    }
}
