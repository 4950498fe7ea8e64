//! Reply format of the fingerprint echo protocol: the client sends one
//! ClientHello record, the server answers with a single JSON line and closes.

use serde::{Deserialize, Serialize};

use crate::fingerprint::fingerprint_record;

/// Largest record fragment a TLS peer may send.
pub const MAX_RECORD_LEN: usize = 16384;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EchoReply {
    Fingerprints {
        ja3: String,
        ja3_raw: String,
        ja4: String,
    },
    Error {
        error: String,
    },
}

impl EchoReply {
    /// Fingerprint a received record, or describe why it could not be.
    pub fn from_record(raw: &[u8]) -> Self {
        match fingerprint_record(raw) {
            Ok(fp) => Self::Fingerprints {
                ja3: fp.ja3.hash,
                ja3_raw: fp.ja3.raw_string,
                ja4: fp.ja4.fingerprint,
            },
            Err(e) => Self::error(e),
        }
    }

    pub fn error(e: impl std::fmt::Display) -> Self {
        Self::Error {
            error: e.to_string(),
        }
    }
}
