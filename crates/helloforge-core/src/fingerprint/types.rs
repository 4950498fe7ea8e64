use std::fmt::Display;

use serde::Serialize;

/// Which optional sub-fields the parser extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldSet {
    /// Fields JA3 hashes; `signature_algorithms` is only skipped.
    #[default]
    Ja3,
    /// JA3 fields plus the signature algorithm list.
    Ja4,
}

/// Parsed ClientHello information needed for JA3/JA4 fingerprinting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientHelloInfo {
    /// Legacy version from the record header
    pub record_version: u16,
    /// `client_version` from the ClientHello body (e.g., 0x0303 for TLS 1.2)
    pub tls_version: u16,
    /// DTLS version; always 0 for TLS records
    pub dtls_version: u16,
    /// Handshake message type (1 for ClientHello)
    pub handshake_type: u8,
    /// Cipher suite values in wire order
    pub cipher_suites: Vec<u16>,
    /// Extension type codes in wire order
    pub extensions: Vec<u16>,
    /// Supported groups / named curves (from extension 0x000a)
    pub elliptic_curves: Vec<u16>,
    /// EC point format values (from extension 0x000b)
    pub ec_point_formats: Vec<u8>,
    /// Signature algorithms (from extension 0x000d), JA4 field set only
    pub signature_algorithms: Vec<u16>,
    /// SCSV (255) and/or renegotiation_info (65281), in wire order
    pub renegotiation: Vec<u16>,
    /// Extension types missing from the extension registry, in wire order
    pub unknown_extensions: Vec<u16>,
}

/// Render codes as decimal strings, preserving order.
pub fn decimal<T: Display>(values: &[T]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Decimal codes joined with `sep`; an empty list gives an empty string.
pub(crate) fn join_decimal<T: Display>(values: &[T], sep: &str) -> String {
    decimal(values).join(sep)
}

/// Result of a JA3 fingerprint computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ja3Result {
    /// 32-character MD5 hex hash
    pub hash: String,
    /// The raw string before hashing
    pub raw_string: String,
}

/// Result of a JA4 fingerprint computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ja4Result {
    /// Canonical string followed by `_` and its 32-character MD5 hex digest
    pub fingerprint: String,
    /// The ten `_`-joined labelled segments
    pub raw: String,
    pub digest: String,
}
