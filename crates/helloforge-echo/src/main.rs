use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{info, warn, Level};

use helloforge_core::echo::{EchoReply, MAX_RECORD_LEN};
use helloforge_core::hello::{CONTENT_TYPE_HANDSHAKE, RECORD_HEADER_LEN};

/// How long a peer gets to deliver its ClientHello record.
const READ_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "helloforge-echo")]
#[command(about = "Answer each incoming ClientHello with its JA3/JA4 fingerprints as one JSON line")]
struct Cli {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8443")]
    listen: SocketAddr,

    /// Debug logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let listener = TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("Failed to bind {}", cli.listen))?;

    info!("helloforge-echo listening on {}", cli.listen);
    info!("Test with: helloforge test -t <template> --server {}", cli.listen);
    info!("Press Ctrl+C to stop\n");

    loop {
        let (mut stream, peer) = listener.accept().await?;

        tokio::spawn(async move {
            let reply = read_record_within(&mut stream, READ_TIMEOUT)
                .await
                .map(|record| EchoReply::from_record(&record))
                .unwrap_or_else(|e| EchoReply::error(format!("{:#}", e)));

            match &reply {
                EchoReply::Fingerprints { ja3, ja4, .. } => {
                    info!("[{}] JA3 {} JA4 {}", peer, ja3, ja4);
                }
                EchoReply::Error { error } => warn!("[{}] {}", peer, error),
            }

            if let Err(e) = write_reply(&mut stream, &reply).await {
                warn!("[{}] failed to send reply: {}", peer, e);
            }
        });
    }
}

async fn read_record_within<S: AsyncRead + Unpin>(
    stream: &mut S,
    timeout: Duration,
) -> Result<Vec<u8>> {
    tokio::time::timeout(timeout, read_record(stream))
        .await
        .with_context(|| format!("no complete ClientHello within {:?}", timeout))?
}

/// Read exactly one TLS handshake record: header plus declared body.
async fn read_record<S: AsyncRead + Unpin>(stream: &mut S) -> Result<Vec<u8>> {
    // content_type(1) + version(2) + length(2)
    let mut header = [0u8; RECORD_HEADER_LEN];
    stream
        .read_exact(&mut header)
        .await
        .context("failed to read TLS header")?;

    if header[0] != CONTENT_TYPE_HANDSHAKE {
        anyhow::bail!("not a TLS handshake (got 0x{:02x})", header[0]);
    }

    let record_len = u16::from_be_bytes([header[3], header[4]]) as usize;
    if record_len > MAX_RECORD_LEN {
        anyhow::bail!("record too large: {} bytes", record_len);
    }

    let mut record = Vec::with_capacity(RECORD_HEADER_LEN + record_len);
    record.extend_from_slice(&header);
    record.resize(RECORD_HEADER_LEN + record_len, 0);
    stream
        .read_exact(&mut record[RECORD_HEADER_LEN..])
        .await
        .context("failed to read record body")?;
    Ok(record)
}

async fn write_reply<S: AsyncWrite + Unpin>(stream: &mut S, reply: &EchoReply) -> Result<()> {
    let mut line = serde_json::to_vec(reply)?;
    line.push(b'\n');
    stream.write_all(&line).await?;
    stream.shutdown().await?;
    Ok(())
}
