//! HTTP byte source for live icecast mounts.

use std::io::Read;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use radio_player::{Connect, StreamTarget};

/// Opens a plain streaming GET against the stream mount.
///
/// The connect and response-header phases are bounded by `timeout`; the body
/// itself is unbounded since a live stream never ends on its own. Stalled
/// body reads surface as errors from the reader and route through the
/// engine's retry path.
pub struct HttpConnect {
    timeout: Duration,
}

impl HttpConnect {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Connect for HttpConnect {
    fn connect(&self, target: &StreamTarget) -> Result<Box<dyn Read + Send>> {
        let resp = ureq::get(target.url())
            .config()
            .timeout_connect(Some(self.timeout))
            .timeout_recv_response(Some(self.timeout))
            .build()
            // Metadata interleaving would corrupt the codec bitstream.
            .header("Icy-MetaData", "0")
            .call()
            .with_context(|| format!("stream request failed: {}", target.url()))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("stream request returned {status}: {}", target.url());
        }
        tracing::info!(url = target.url(), status = status.as_u16(), "stream connected");

        let (_, body) = resp.into_parts();
        Ok(Box::new(body.into_reader()))
    }
}
