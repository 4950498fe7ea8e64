//! JSON template records: a ClientHello with base64 fields plus the two
//! fingerprints it is expected to produce.

mod store;

pub use store::TemplateStore;

use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::fingerprint::clienthello::ParseError;
use crate::fingerprint::fingerprint_record;
use crate::hello::builder::build_client_hello;
use crate::hello::{BuildError, ClientHelloSpec, Extension, RANDOM_LEN};
use crate::profile::{BrowserProfile, HelloParams, ProfileError};

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid base64 in {field}: {source}")]
    Base64 {
        field: &'static str,
        #[source]
        source: base64::DecodeError,
    },
    #[error("invalid cipher suite {0:?}, expected \"0xHHHH\"")]
    InvalidCipherSuite(String),
    #[error("invalid protocol version {0:?}")]
    InvalidVersion(String),
    #[error("random must be 32 bytes, got {0}")]
    InvalidRandomLength(usize),
    #[error("{field} value {value} does not fit its wire width")]
    ValueOutOfRange { field: &'static str, value: u32 },
    #[error("template already exists: {}", .0.display())]
    AlreadyExists(PathBuf),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// A stored browser template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserTemplate {
    pub version: String,
    /// RFC 3339 timestamp of generation
    pub timestamp: String,
    pub client_hello: ClientHelloTemplate,
    pub ja3_fingerprint: String,
    pub ja4_fingerprint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientHelloTemplate {
    /// Display form, e.g. `"TLS 1.2"`
    pub version: String,
    /// base64
    pub random: String,
    /// base64
    pub session_id: String,
    /// `"0xHHHH"` codes in wire order
    pub cipher_suites: Vec<String>,
    pub compression_methods: Vec<u32>,
    pub extensions: Vec<ExtensionTemplate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionTemplate {
    #[serde(rename = "type")]
    pub ext_type: u32,
    /// base64 payload
    pub data: String,
}

impl ClientHelloTemplate {
    pub fn from_spec(spec: &ClientHelloSpec) -> Self {
        Self {
            version: version_label(spec.version),
            random: STANDARD.encode(spec.random),
            session_id: STANDARD.encode(&spec.session_id),
            cipher_suites: spec
                .cipher_suites
                .iter()
                .map(|c| format!("0x{c:04x}"))
                .collect(),
            compression_methods: spec.compression_methods.iter().map(|m| u32::from(*m)).collect(),
            extensions: spec
                .extensions
                .iter()
                .map(|e| ExtensionTemplate {
                    ext_type: u32::from(e.ext_type),
                    data: STANDARD.encode(&e.data),
                })
                .collect(),
        }
    }

    /// Decode every field back into a builder spec.
    pub fn to_spec(&self) -> Result<ClientHelloSpec, TemplateError> {
        let random_bytes = decode("random", &self.random)?;
        let random: [u8; RANDOM_LEN] = random_bytes
            .as_slice()
            .try_into()
            .map_err(|_| TemplateError::InvalidRandomLength(random_bytes.len()))?;

        let cipher_suites = self
            .cipher_suites
            .iter()
            .map(|s| parse_cipher_suite(s))
            .collect::<Result<Vec<_>, _>>()?;

        let compression_methods = self
            .compression_methods
            .iter()
            .map(|m| {
                u8::try_from(*m).map_err(|_| TemplateError::ValueOutOfRange {
                    field: "compression method",
                    value: *m,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let extensions = self
            .extensions
            .iter()
            .map(|e| {
                let ext_type = u16::try_from(e.ext_type).map_err(|_| {
                    TemplateError::ValueOutOfRange {
                        field: "extension type",
                        value: e.ext_type,
                    }
                })?;
                Ok(Extension::new(ext_type, decode("extension data", &e.data)?))
            })
            .collect::<Result<Vec<_>, TemplateError>>()?;

        Ok(ClientHelloSpec {
            version: parse_version_label(&self.version)?,
            random,
            session_id: decode("session_id", &self.session_id)?,
            cipher_suites,
            compression_methods,
            extensions,
        })
    }
}

impl BrowserTemplate {
    /// Build `spec`, fingerprint the bytes and wrap everything in a record.
    pub fn from_spec(
        version: &str,
        spec: &ClientHelloSpec,
        timestamp: String,
    ) -> Result<Self, TemplateError> {
        let bytes = build_client_hello(spec)?;
        let fp = fingerprint_record(&bytes)?;

        Ok(Self {
            version: version.to_string(),
            timestamp,
            client_hello: ClientHelloTemplate::from_spec(spec),
            ja3_fingerprint: fp.ja3.hash,
            ja4_fingerprint: fp.ja4.fingerprint,
            metadata: None,
        })
    }

    /// Template for `version` assembled from a registry profile.
    pub fn generate(
        version: &str,
        profile: &BrowserProfile,
        params: &HelloParams,
        timestamp: String,
    ) -> Result<Self, TemplateError> {
        let spec = profile.client_hello_spec(params);
        let mut template = Self::from_spec(version, &spec, timestamp)?;

        let mut metadata = serde_json::Map::new();
        metadata.insert("profile".into(), profile.name.into());
        metadata.insert("server_name".into(), params.server_name.clone().into());
        template.metadata = Some(metadata);

        Ok(template)
    }

    /// The ClientHello record this template describes.
    pub fn client_hello_bytes(&self) -> Result<Vec<u8>, TemplateError> {
        Ok(build_client_hello(&self.client_hello.to_spec()?)?)
    }
}

fn decode(field: &'static str, value: &str) -> Result<Vec<u8>, TemplateError> {
    STANDARD
        .decode(value)
        .map_err(|source| TemplateError::Base64 { field, source })
}

fn parse_cipher_suite(s: &str) -> Result<u16, TemplateError> {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .filter(|hex| !hex.is_empty() && hex.len() <= 4)
        .and_then(|hex| u16::from_str_radix(hex, 16).ok())
        .ok_or_else(|| TemplateError::InvalidCipherSuite(s.to_string()))
}

/// `0x0303` → `"TLS 1.2"`, `0x0300` → `"SSL 3.0"`, anything else as hex.
pub fn version_label(version: u16) -> String {
    match version {
        0x0300 => "SSL 3.0".to_string(),
        0x0301..=0x03ff => format!("TLS 1.{}", (version & 0xff) - 1),
        _ => format!("0x{version:04x}"),
    }
}

/// Inverse of [`version_label`].
pub fn parse_version_label(label: &str) -> Result<u16, TemplateError> {
    let invalid = || TemplateError::InvalidVersion(label.to_string());
    let label = label.trim();

    if label == "SSL 3.0" {
        return Ok(0x0300);
    }
    if let Some(minor) = label.strip_prefix("TLS 1.") {
        let minor: u16 = minor.parse().map_err(|_| invalid())?;
        return 0x0301u16
            .checked_add(minor)
            .filter(|v| *v <= 0x03ff)
            .ok_or_else(invalid);
    }
    if let Some(hex) = label.strip_prefix("0x") {
        return u16::from_str_radix(hex, 16).map_err(|_| invalid());
    }
    Err(invalid())
}
