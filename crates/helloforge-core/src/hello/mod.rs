pub mod builder;
pub mod ext;

/// TLS record content type for handshake messages.
pub const CONTENT_TYPE_HANDSHAKE: u8 = 0x16;
/// Handshake message type of a ClientHello.
pub const HANDSHAKE_CLIENT_HELLO: u8 = 0x01;
/// content type (1) + legacy version (2) + fragment length (2)
pub const RECORD_HEADER_LEN: usize = 5;
/// message type (1) + body length (3)
pub const HANDSHAKE_HEADER_LEN: usize = 4;
pub const RANDOM_LEN: usize = 32;

pub const TLS1_2: u16 = 0x0303;
pub const TLS1_3: u16 = 0x0304;

/// A single ClientHello extension: type code plus opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    pub ext_type: u16,
    pub data: Vec<u8>,
}

impl Extension {
    pub fn new(ext_type: u16, data: impl Into<Vec<u8>>) -> Self {
        Self {
            ext_type,
            data: data.into(),
        }
    }
}

/// Declarative description of a ClientHello.
///
/// Cipher suites and extensions are emitted in exactly the order given; the
/// fingerprints hash that order verbatim. `random` and `session_id` are
/// supplied by the caller so that building stays deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHelloSpec {
    /// Record-layer legacy version and ClientHello `client_version`.
    pub version: u16,
    pub random: [u8; RANDOM_LEN],
    pub session_id: Vec<u8>,
    pub cipher_suites: Vec<u16>,
    pub compression_methods: Vec<u8>,
    pub extensions: Vec<Extension>,
}

impl ClientHelloSpec {
    /// Extension type codes in spec order.
    pub fn extension_types(&self) -> Vec<u16> {
        self.extensions.iter().map(|e| e.ext_type).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("session id is {0} bytes, the length prefix holds at most 255")]
    SessionIdTooLong(usize),
    #[error("{field} length {len} exceeds the {max} its length field can encode")]
    LengthOverflow {
        field: &'static str,
        len: usize,
        max: usize,
    },
    #[error("a ClientHello must offer at least one cipher suite")]
    EmptyCipherSuiteList,
}
