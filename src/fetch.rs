//! Download-if-missing for the input datasets

use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

use log::info;
use tempfile::NamedTempFile;

use crate::config::DatasetSource;
use crate::error::DashboardError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Per read, not for the whole body
const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Make sure `source.path` exists locally, downloading it from `source.url` otherwise.
///
/// The body is streamed into a temporary file next to the target and only
/// renamed into place once complete, so a failed download never leaves a
/// truncated dataset behind. HTML bodies (a login or virus-scan interstitial
/// instead of the file) are rejected before anything is written.
///
/// # Returns
/// * `true` if the file was downloaded, `false` if it was already present
pub fn ensure_local(source: &DatasetSource) -> Result<bool, DashboardError> {
    let path = Path::new(&source.path);
    if path.exists() {
        return Ok(false);
    }

    info!("Downloading {} from {}", source.path, source.url);
    let fail = |reason: String| DashboardError::Fetch {
        url: source.url.clone(),
        reason,
    };

    let agent = ureq::AgentBuilder::new()
        .timeout_connect(CONNECT_TIMEOUT)
        .timeout_read(READ_TIMEOUT)
        .build();
    let response = match agent.get(&source.url).call() {
        Ok(response) => response,
        Err(ureq::Error::Status(code, _)) => return Err(fail(format!("http status {code}"))),
        Err(ureq::Error::Transport(err)) => return Err(fail(format!("transport failure: {err}"))),
    };

    if response.content_type() == "text/html" {
        return Err(fail("server returned an HTML page instead of CSV".to_string()));
    }
    let mut reader = BufReader::new(response.into_reader());
    if looks_like_html(reader.fill_buf().map_err(|e| fail(e.to_string()))?) {
        return Err(fail("response body is HTML, not CSV".to_string()));
    }

    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut temp_file = NamedTempFile::new_in(parent).map_err(|e| fail(e.to_string()))?;
    let bytes = io::copy(&mut reader, &mut temp_file)
        .map_err(|e| fail(e.to_string()))?;
    temp_file
        .persist(path)
        .map_err(|e| fail(e.error.to_string()))?;

    info!("Saved {} ({} bytes)", source.path, bytes);
    Ok(true)
}

fn looks_like_html(head: &[u8]) -> bool {
    head.iter()
        .position(|b| !b.is_ascii_whitespace())
        .is_some_and(|start| head[start] == b'<')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use tempfile::tempdir;

    /// Serve one HTTP response on a local port and return its URL
    fn serve_once(content_type: &'static str, body: &'static str) -> (String, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/dataset.csv", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
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
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                content_type,
                body.len(),
                body
            );
            // The client may hang up early on a rejected body
            let _ = stream.write_all(response.as_bytes());
        });

        (url, handle)
    }

    #[test]
    fn test_existing_file_is_not_fetched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rfm_segmentation.csv");
        fs::write(&path, "Customer ID,Segment\n").unwrap();

        let source = DatasetSource {
            path: path.to_str().unwrap().to_string(),
            // Never contacted because the file exists
            url: "http://127.0.0.1:9/unreachable".to_string(),
        };

        assert!(!ensure_local(&source).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "Customer ID,Segment\n");
    }

    #[test]
    fn test_fetch_failure_is_an_error_and_leaves_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("df_merged_with_segments.csv");

        let source = DatasetSource {
            path: path.to_str().unwrap().to_string(),
            url: "http://127.0.0.1:9/unreachable".to_string(),
        };

        let err = ensure_local(&source).unwrap_err();
        assert!(matches!(err, DashboardError::Fetch { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_download_is_saved() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rfm_segmentation.csv");
        let body = "Customer ID,Segment\n12346,At Risk\n";
        let (url, server) = serve_once("text/csv", body);

        let source = DatasetSource {
            path: path.to_str().unwrap().to_string(),
            url,
        };

        assert!(ensure_local(&source).unwrap());
        server.join().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), body);

        // Present now, so nothing is fetched again
        assert!(!ensure_local(&source).unwrap());
    }

    #[test]
    fn test_html_response_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("df_merged_with_segments.csv");
        let (url, server) = serve_once(
            "text/html; charset=utf-8",
            "<!DOCTYPE html><html><body>Google Drive can't scan this file for viruses.</body></html>",
        );

        let source = DatasetSource {
            path: path.to_str().unwrap().to_string(),
            url,
        };

        let err = ensure_local(&source).unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, DashboardError::Fetch { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_html_body_with_other_content_type_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("df_merged_with_segments.csv");
        let (url, server) = serve_once("application/octet-stream", "\n  <html><body>Sign in</body></html>");

        let source = DatasetSource {
            path: path.to_str().unwrap().to_string(),
            url,
        };

        let err = ensure_local(&source).unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, DashboardError::Fetch { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_looks_like_html() {
        assert!(looks_like_html(b"<!DOCTYPE html>"));
        assert!(looks_like_html(b"\r\n  <html>"));
        assert!(!looks_like_html(b"Invoice,Description\n"));
        assert!(!looks_like_html(b""));
    }
}
