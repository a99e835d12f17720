//! HTTP archive download.

use crate::traits::{ArchiveSource, FetchError};
use async_trait::async_trait;
use std::io::Read;
use tracing::{debug, instrument};

const USER_AGENT: &str = concat!("item-harvester/", env!("CARGO_PKG_VERSION"));

/// Downloads archives over HTTP(S) with a blocking `ureq` agent.
///
/// Requests run on tokio's blocking pool. There is no timeout and no retry.
#[derive(Clone)]
pub struct HttpArchiveSource {
    agent: ureq::Agent,
}

impl HttpArchiveSource {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().user_agent(USER_AGENT).build(),
        }
    }
}

impl Default for HttpArchiveSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArchiveSource for HttpArchiveSource {
    fn source_id(&self) -> &str {
        "http"
    }

    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let agent = self.agent.clone();
        let url = url.to_string();

        tokio::task::spawn_blocking(move || -> Result<Vec<u8>, FetchError> {
            // Non-2xx statuses come back as errors
            let response = agent
                .get(&url)
                .call()
                .map_err(|e| FetchError::Http(e.to_string()))?;
            debug!(status = response.status(), "Archive response received");

            let mut body = Vec::new();
            response.into_reader().read_to_end(&mut body)?;
            Ok(body)
        })
        .await
        .map_err(|e| FetchError::Join(e.to_string()))?
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Serves one canned HTTP response on a loopback listener and returns its base URL.
    pub(crate) fn serve_once(status_line: &'static str, body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 512];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }
            let head = format!(
                "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(body).unwrap();
            stream.flush().unwrap();
        });
        format!("http://{addr}")
    }
}
