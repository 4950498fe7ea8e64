use tracing::trace;

use super::{
    BuildError, ClientHelloSpec, CONTENT_TYPE_HANDSHAKE, HANDSHAKE_CLIENT_HELLO,
    HANDSHAKE_HEADER_LEN, RANDOM_LEN, RECORD_HEADER_LEN,
};

const U8_MAX: usize = u8::MAX as usize;
const U16_MAX: usize = u16::MAX as usize;
const U24_MAX: usize = 0x00ff_ffff;

/// Lengths of every variable-size block, validated before anything is written.
struct Layout {
    cipher_block_len: usize,
    extensions_len: usize,
    body_len: usize,
    fragment_len: usize,
}

impl Layout {
    fn measure(spec: &ClientHelloSpec) -> Result<Self, BuildError> {
        if spec.session_id.len() > U8_MAX {
            return Err(BuildError::SessionIdTooLong(spec.session_id.len()));
        }
        if spec.cipher_suites.is_empty() {
            return Err(BuildError::EmptyCipherSuiteList);
        }

        let cipher_block_len = spec.cipher_suites.len() * 2;
        fits("cipher suite block", cipher_block_len, U16_MAX)?;
        fits("compression methods", spec.compression_methods.len(), U8_MAX)?;

        let mut extensions_len = 0usize;
        for ext in &spec.extensions {
            fits("extension payload", ext.data.len(), U16_MAX)?;
            extensions_len += 4 + ext.data.len();
            fits("extensions block", extensions_len, U16_MAX)?;
        }

        let body_len = 2
            + RANDOM_LEN
            + 1
            + spec.session_id.len()
            + 2
            + cipher_block_len
            + 1
            + spec.compression_methods.len()
            + 2
            + extensions_len;
        fits("handshake body", body_len, U24_MAX)?;

        let fragment_len = HANDSHAKE_HEADER_LEN + body_len;
        fits("record fragment", fragment_len, U16_MAX)?;

        Ok(Self {
            cipher_block_len,
            extensions_len,
            body_len,
            fragment_len,
        })
    }
}

fn fits(field: &'static str, len: usize, max: usize) -> Result<(), BuildError> {
    if len > max {
        return Err(BuildError::LengthOverflow { field, len, max });
    }
    Ok(())
}

/// Encode `spec` as a complete TLS record carrying one ClientHello.
///
/// The output depends only on `spec`: the same spec always yields the same
/// bytes. Every length field is checked against its width first, so an
/// error never leaves a half-written buffer behind.
pub fn build_client_hello(spec: &ClientHelloSpec) -> Result<Vec<u8>, BuildError> {
    let layout = Layout::measure(spec)?;
    let mut out = Vec::with_capacity(RECORD_HEADER_LEN + layout.fragment_len);

    // Record header
    out.push(CONTENT_TYPE_HANDSHAKE);
    out.extend_from_slice(&spec.version.to_be_bytes());
    put_u16(&mut out, layout.fragment_len);

    // Handshake header
    out.push(HANDSHAKE_CLIENT_HELLO);
    put_u24(&mut out, layout.body_len);

    out.extend_from_slice(&spec.version.to_be_bytes());
    out.extend_from_slice(&spec.random);

    out.push(spec.session_id.len() as u8);
    out.extend_from_slice(&spec.session_id);

    put_u16(&mut out, layout.cipher_block_len);
    for suite in &spec.cipher_suites {
        out.extend_from_slice(&suite.to_be_bytes());
    }

    out.push(spec.compression_methods.len() as u8);
    out.extend_from_slice(&spec.compression_methods);

    put_u16(&mut out, layout.extensions_len);
    for ext in &spec.extensions {
        out.extend_from_slice(&ext.ext_type.to_be_bytes());
        put_u16(&mut out, ext.data.len());
        out.extend_from_slice(&ext.data);
    }

    debug_assert_eq!(out.len(), RECORD_HEADER_LEN + layout.fragment_len);
    trace!(
        "built ClientHello: {} bytes, {} suites, {} extensions",
        out.len(),
        spec.cipher_suites.len(),
        spec.extensions.len()
    );
    Ok(out)
}

fn put_u16(out: &mut Vec<u8>, value: usize) {
    out.extend_from_slice(&(value as u16).to_be_bytes());
}

fn put_u24(out: &mut Vec<u8>, value: usize) {
    let bytes = (value as u32).to_be_bytes();
    out.extend_from_slice(&bytes[1..]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hello::{ext, Extension, TLS1_2};

    fn chrome_like_spec() -> ClientHelloSpec {
        ClientHelloSpec {
            version: TLS1_2,
            random: [0x42; 32],
            session_id: vec![0x24; 32],
            cipher_suites: vec![0x1301, 0x1302, 0x1303, 0xc02f, 0xc02b],
            compression_methods: vec![0],
            extensions: vec![],
        }
    }

    #[test]
    fn headers_carry_handshake_and_client_hello_types() {
        let bytes = build_client_hello(&chrome_like_spec()).unwrap();
        assert_eq!(bytes[0], 0x16);
        assert_eq!(&bytes[1..3], &[0x03, 0x03]);
        assert_eq!(bytes[5], 0x01);

        let record_len = u16::from_be_bytes([bytes[3], bytes[4]]) as usize;
        assert_eq!(record_len, bytes.len() - 5);
        let body_len = u32::from_be_bytes([0, bytes[6], bytes[7], bytes[8]]) as usize;
        assert_eq!(body_len, bytes.len() - 9);
    }

    #[test]
    fn exact_wire_layout() {
        let spec = ClientHelloSpec {
            version: TLS1_2,
            random: [0x11; 32],
            session_id: vec![],
            cipher_suites: vec![0x1301],
            compression_methods: vec![0],
            extensions: vec![Extension::new(ext::EC_POINT_FORMATS, vec![0x01, 0x00])],
        };

        let mut expected = vec![0x16, 0x03, 0x03, 0x00, 0x35, 0x01, 0x00, 0x00, 0x31, 0x03, 0x03];
        expected.extend_from_slice(&[0x11; 32]);
        expected.extend_from_slice(&[
            0x00, // session id length
            0x00, 0x02, 0x13, 0x01, // cipher suites
            0x01, 0x00, // compression
            0x00, 0x06, 0x00, 0x0b, 0x00, 0x02, 0x01, 0x00, // extensions
        ]);

        assert_eq!(build_client_hello(&spec).unwrap(), expected);
    }

    #[test]
    fn zero_extensions_still_emit_block_length() {
        let bytes = build_client_hello(&chrome_like_spec()).unwrap();
        assert_eq!(&bytes[bytes.len() - 2..], &[0x00, 0x00]);
    }

    #[test]
    fn build_is_deterministic() {
        let spec = chrome_like_spec();
        assert_eq!(
            build_client_hello(&spec).unwrap(),
            build_client_hello(&spec).unwrap()
        );
    }

    #[test]
    fn rejects_empty_cipher_list() {
        let mut spec = chrome_like_spec();
        spec.cipher_suites.clear();
        assert_eq!(
            build_client_hello(&spec),
            Err(BuildError::EmptyCipherSuiteList)
        );
    }

    #[test]
    fn rejects_long_session_id() {
        let mut spec = chrome_like_spec();
        spec.session_id = vec![0; 256];
        assert_eq!(
            build_client_hello(&spec),
            Err(BuildError::SessionIdTooLong(256))
        );
    }

    #[test]
    fn max_session_id_is_accepted() {
        let mut spec = chrome_like_spec();
        spec.session_id = vec![0; 255];
        let bytes = build_client_hello(&spec).unwrap();
        assert_eq!(bytes[9 + 2 + 32], 0xff);
    }

    #[test]
    fn rejects_cipher_block_overflow() {
        let mut spec = chrome_like_spec();
        spec.cipher_suites = vec![0x1301; 32768];
        assert!(matches!(
            build_client_hello(&spec),
            Err(BuildError::LengthOverflow { field: "cipher suite block", len: 65536, .. })
        ));
    }

    #[test]
    fn rejects_oversized_extension_payload() {
        let mut spec = chrome_like_spec();
        spec.extensions = vec![Extension::new(ext::PADDING, vec![0; 65536])];
        assert!(matches!(
            build_client_hello(&spec),
            Err(BuildError::LengthOverflow { field: "extension payload", .. })
        ));
    }

    #[test]
    fn rejects_extensions_block_overflow() {
        let mut spec = chrome_like_spec();
        spec.extensions = vec![
            Extension::new(ext::PADDING, vec![0; 40000]),
            Extension::new(ext::PADDING, vec![0; 40000]),
        ];
        assert!(matches!(
            build_client_hello(&spec),
            Err(BuildError::LengthOverflow { field: "extensions block", .. })
        ));
    }

    #[test]
    fn rejects_record_overflow() {
        // Each block fits its own field, the sum does not fit the record.
        let mut spec = chrome_like_spec();
        spec.cipher_suites = vec![0x1301; 20000];
        spec.extensions = vec![Extension::new(ext::PADDING, vec![0; 30000])];
        assert!(matches!(
            build_client_hello(&spec),
            Err(BuildError::LengthOverflow { field: "record fragment", .. })
        ));
    }

    #[test]
    fn rejects_too_many_compression_methods() {
        let mut spec = chrome_like_spec();
        spec.compression_methods = vec![0; 256];
        assert!(matches!(
            build_client_hello(&spec),
            Err(BuildError::LengthOverflow { field: "compression methods", .. })
        ));
    }
}
