//! Sink that writes payloads to stdout.

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use vitals_core::encode::EncodedSnapshot;
use vitals_core::error::{Result, VitalsError};

use super::Sink;

/// Writes each payload to stdout with a trailing newline. Meant for demos
/// and local debugging, not production traffic.
#[derive(Debug, Default)]
pub struct ConsoleSink;

#[async_trait]
impl Sink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    async fn send(&self, payload: EncodedSnapshot) -> Result<()> {
        let mut out = tokio::io::stdout();
        out.write_all(&payload.body)
            .await
            .map_err(|e| VitalsError::Transport(format!("stdout: {e}")))?;
        out.write_all(b"\n")
            .await
            .map_err(|e| VitalsError::Transport(format!("stdout: {e}")))?;
        out.flush()
            .await
            .map_err(|e| VitalsError::Transport(format!("stdout: {e}")))?;
        Ok(())
    }
}
