pub mod clienthello;
pub mod ja3;
pub mod ja4;
pub mod types;

use serde::Serialize;

use crate::fingerprint::clienthello::{parse_client_hello, ParseError};
use crate::fingerprint::ja3::compute_ja3;
use crate::fingerprint::ja4::compute_ja4;
use crate::fingerprint::types::{ClientHelloInfo, FieldSet, Ja3Result, Ja4Result};

/// Everything extracted from one ClientHello record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fingerprints {
    pub info: ClientHelloInfo,
    pub ja3: Ja3Result,
    pub ja4: Ja4Result,
}

/// Parse `raw` with the JA4 field set and compute both fingerprints.
pub fn fingerprint_record(raw: &[u8]) -> Result<Fingerprints, ParseError> {
    let info = parse_client_hello(raw, FieldSet::Ja4)?;
    let ja3 = compute_ja3(&info);
    let ja4 = compute_ja4(&info);
    Ok(Fingerprints { info, ja3, ja4 })
}
