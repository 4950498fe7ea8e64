//! Read-only registry of browser ClientHello profiles keyed by major version.

mod chrome;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::hello::{ext, ClientHelloSpec, Extension, HANDSHAKE_HEADER_LEN, RANDOM_LEN};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    #[error("unsupported browser version: {0}")]
    Unsupported(String),
    #[error("invalid version format: {0}")]
    InvalidVersion(String),
}

/// What a browser offers in its ClientHello, independent of any one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserProfile {
    pub name: &'static str,
    pub major: u32,
    pub tls_version: u16,
    pub cipher_suites: Vec<u16>,
    /// Extension types in the order the browser sends them.
    pub extensions: Vec<u16>,
    pub compression_methods: Vec<u8>,
    pub supported_groups: Vec<u16>,
    pub signature_algorithms: Vec<u16>,
    pub alpn_protocols: Vec<&'static str>,
    pub supported_versions: Vec<u16>,
    pub psk_modes: Vec<u8>,
    pub cert_compression_algs: Vec<u16>,
}

/// Per-connection values the caller supplies; the profile never invents them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelloParams {
    pub random: [u8; RANDOM_LEN],
    pub session_id: Vec<u8>,
    pub server_name: String,
    /// X25519 public key placed in `key_share`.
    pub key_share: [u8; 32],
}

impl BrowserProfile {
    /// Assemble the ClientHello this browser would send with `params`.
    ///
    /// The `padding` extension follows the BoringSSL rule: a handshake
    /// of 256 to 511 bytes without padding is padded up to 512 (or by a
    /// one-byte payload when fewer than five bytes are missing), otherwise
    /// it is left out.
    pub fn client_hello_spec(&self, params: &HelloParams) -> ClientHelloSpec {
        let mut spec = ClientHelloSpec {
            version: self.tls_version,
            random: params.random,
            session_id: params.session_id.clone(),
            cipher_suites: self.cipher_suites.clone(),
            compression_methods: self.compression_methods.clone(),
            extensions: Vec::with_capacity(self.extensions.len()),
        };

        for &ext_type in &self.extensions {
            if ext_type != ext::PADDING {
                spec.extensions
                    .push(Extension::new(ext_type, self.extension_payload(ext_type, params)));
            }
        }

        if let Some(at) = self.extensions.iter().position(|t| *t == ext::PADDING) {
            if let Some(len) = padding_len(unpadded_handshake_len(&spec)) {
                let at = at.min(spec.extensions.len());
                spec.extensions
                    .insert(at, Extension::new(ext::PADDING, vec![0; len]));
            }
        }

        spec
    }

    /// Payload for one extension type, built from the profile's lists.
    pub fn extension_payload(&self, ext_type: u16, params: &HelloParams) -> Vec<u8> {
        match ext_type {
            ext::SERVER_NAME => {
                let host = params.server_name.as_bytes();
                let mut data = Vec::with_capacity(host.len() + 5);
                data.extend_from_slice(&((host.len() + 3) as u16).to_be_bytes());
                data.push(0x00); // host_name
                data.extend_from_slice(&(host.len() as u16).to_be_bytes());
                data.extend_from_slice(host);
                data
            }
            ext::SUPPORTED_GROUPS => u16_vector(&self.supported_groups),
            ext::EC_POINT_FORMATS => vec![0x01, 0x00],
            ext::SIGNATURE_ALGORITHMS => u16_vector(&self.signature_algorithms),
            ext::ALPN => {
                let mut list = Vec::new();
                for proto in &self.alpn_protocols {
                    list.push(proto.len() as u8);
                    list.extend_from_slice(proto.as_bytes());
                }
                let mut data = (list.len() as u16).to_be_bytes().to_vec();
                data.extend_from_slice(&list);
                data
            }
            // OCSP, empty responder id list, empty request extensions
            ext::STATUS_REQUEST => vec![0x01, 0x00, 0x00, 0x00, 0x00],
            ext::RENEGOTIATION_INFO => vec![0x00],
            ext::SUPPORTED_VERSIONS => {
                let mut data = vec![(self.supported_versions.len() * 2) as u8];
                for v in &self.supported_versions {
                    data.extend_from_slice(&v.to_be_bytes());
                }
                data
            }
            ext::PSK_KEY_EXCHANGE_MODES => {
                let mut data = vec![self.psk_modes.len() as u8];
                data.extend_from_slice(&self.psk_modes);
                data
            }
            ext::COMPRESS_CERTIFICATE => {
                let mut data = vec![(self.cert_compression_algs.len() * 2) as u8];
                for alg in &self.cert_compression_algs {
                    data.extend_from_slice(&alg.to_be_bytes());
                }
                data
            }
            ext::KEY_SHARE => {
                // One x25519 share
                let mut data = Vec::with_capacity(2 + 4 + 32);
                data.extend_from_slice(&(4u16 + 32).to_be_bytes());
                data.extend_from_slice(&0x001du16.to_be_bytes());
                data.extend_from_slice(&32u16.to_be_bytes());
                data.extend_from_slice(&params.key_share);
                data
            }
            chrome::APPLICATION_SETTINGS => {
                let mut list = Vec::new();
                for proto in self.alpn_protocols.iter().filter(|p| **p == "h2") {
                    list.push(proto.len() as u8);
                    list.extend_from_slice(proto.as_bytes());
                }
                let mut data = (list.len() as u16).to_be_bytes().to_vec();
                data.extend_from_slice(&list);
                data
            }
            ext::EXTENDED_MASTER_SECRET
            | ext::SESSION_TICKET
            | ext::SIGNED_CERTIFICATE_TIMESTAMP => Vec::new(),
            _ => vec![0x00],
        }
    }
}

fn u16_vector(values: &[u16]) -> Vec<u8> {
    let mut data = Vec::with_capacity(2 + values.len() * 2);
    data.extend_from_slice(&((values.len() * 2) as u16).to_be_bytes());
    for v in values {
        data.extend_from_slice(&v.to_be_bytes());
    }
    data
}

/// Handshake message length (header included) of `spec` as it stands.
fn unpadded_handshake_len(spec: &ClientHelloSpec) -> usize {
    let extensions: usize = spec.extensions.iter().map(|e| 4 + e.data.len()).sum();
    HANDSHAKE_HEADER_LEN
        + 2
        + RANDOM_LEN
        + 1
        + spec.session_id.len()
        + 2
        + spec.cipher_suites.len() * 2
        + 1
        + spec.compression_methods.len()
        + 2
        + extensions
}

/// Padding payload length for a handshake of `len` bytes before padding.
/// The extension header takes four of the missing bytes; when it does not
/// fit, a one-byte payload is sent anyway.
fn padding_len(len: usize) -> Option<usize> {
    if len > 0xff && len < 0x200 {
        let missing = 0x200 - len;
        Some(if missing >= 5 { missing - 4 } else { 1 })
    } else {
        None
    }
}

/// Dotted four-part browser version, e.g. `120.0.6099.109`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BrowserVersion {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
    pub patch: u32,
}

impl FromStr for BrowserVersion {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split('.')
            .map(|p| p.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ProfileError::InvalidVersion(s.to_string()))?;
        match parts[..] {
            [major, minor, build, patch] => Ok(Self {
                major,
                minor,
                build,
                patch,
            }),
            _ => Err(ProfileError::InvalidVersion(s.to_string())),
        }
    }
}

impl fmt::Display for BrowserVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.major, self.minor, self.build, self.patch)
    }
}

/// Immutable lookup from major version to profile. Built once and passed to
/// whoever needs it.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: BTreeMap<u32, BrowserProfile>,
}

impl ProfileRegistry {
    pub fn new(profiles: impl IntoIterator<Item = BrowserProfile>) -> Self {
        Self {
            profiles: profiles.into_iter().map(|p| (p.major, p)).collect(),
        }
    }

    /// Profiles shipped with the crate.
    pub fn builtin() -> Self {
        Self::new([chrome::chrome_120()])
    }

    /// Select the profile for a version string by its major component;
    /// `"120"` and `"120.0.6099.109"` both resolve to the Chrome 120 profile.
    pub fn lookup(&self, version: &str) -> Result<&BrowserProfile, ProfileError> {
        let major = version
            .split('.')
            .next()
            .and_then(|m| m.parse::<u32>().ok())
            .ok_or_else(|| ProfileError::InvalidVersion(version.to_string()))?;
        self.profiles
            .get(&major)
            .ok_or_else(|| ProfileError::Unsupported(version.to_string()))
    }

    pub fn majors(&self) -> impl Iterator<Item = u32> + '_ {
        self.profiles.keys().copied()
    }
}
