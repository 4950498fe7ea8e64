//! Client side of the fingerprint echo protocol.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

use helloforge_core::echo::EchoReply;

/// JA3 hash and JA4 fingerprint as seen by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Echoed {
    pub ja3: String,
    pub ja3_raw: String,
    pub ja4: String,
}

/// Send one ClientHello record to `addr` and read the server's JSON line.
pub async fn echo_fingerprints(addr: &str, record: &[u8], timeout: Duration) -> Result<Echoed> {
    let exchange = async {
        let mut stream = TcpStream::connect(addr)
            .await
            .with_context(|| format!("Failed to connect to {}", addr))?;
        stream.write_all(record).await?;
        debug!("sent {} bytes to {}", record.len(), addr);

        let mut line = String::new();
        BufReader::new(stream).read_line(&mut line).await?;
        if line.trim().is_empty() {
            anyhow::bail!("{} closed the connection without a reply", addr);
        }
        let reply: EchoReply = serde_json::from_str(line.trim())
            .with_context(|| format!("Unexpected reply from {}: {}", addr, line.trim()))?;
        Ok::<_, anyhow::Error>(reply)
    };

    let reply = tokio::time::timeout(timeout, exchange)
        .await
        .with_context(|| format!("No reply from {} within {:?}", addr, timeout))??;

    match reply {
        EchoReply::Fingerprints { ja3, ja3_raw, ja4 } => Ok(Echoed { ja3, ja3_raw, ja4 }),
        EchoReply::Error { error } => anyhow::bail!("Server rejected the ClientHello: {}", error),
    }
}
