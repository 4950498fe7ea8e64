use tracing::trace;

use crate::fingerprint::types::{ClientHelloInfo, FieldSet};
use crate::hello::ext::{
    is_known_extension, EC_POINT_FORMATS, EMPTY_RENEGOTIATION_INFO_SCSV, RENEGOTIATION_INFO,
    SIGNATURE_ALGORITHMS, SUPPORTED_GROUPS,
};
use crate::hello::{
    CONTENT_TYPE_HANDSHAKE, HANDSHAKE_CLIENT_HELLO, RANDOM_LEN, RECORD_HEADER_LEN,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("not enough data: got {0} bytes, a record header needs 5")]
    TooShort(usize),
    #[error("not a TLS handshake record (content type 0x{0:02x})")]
    NotHandshakeRecord(u8),
    #[error("not a ClientHello message (handshake type 0x{0:02x})")]
    NotClientHello(u8),
    #[error("truncated {0}: declared length runs past the available bytes")]
    TruncatedField(&'static str),
}

/// Bounds-checked big-endian cursor. Every read names the field it is
/// consuming so a short buffer reports where it ran out.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }

    fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], ParseError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or(ParseError::TruncatedField(field))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self, field: &'static str) -> Result<u8, ParseError> {
        Ok(self.take(1, field)?[0])
    }

    fn u16(&mut self, field: &'static str) -> Result<u16, ParseError> {
        let b = self.take(2, field)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u24(&mut self, field: &'static str) -> Result<usize, ParseError> {
        let b = self.take(3, field)?;
        Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]) as usize)
    }
}

/// Parse raw bytes into a `ClientHelloInfo`.
///
/// The input must start with the TLS record header and hold the whole
/// record. Bytes after the declared record length are ignored. Any length
/// prefix that points past its enclosing block fails with
/// [`ParseError::TruncatedField`]; no partial result is returned.
pub fn parse_client_hello(raw: &[u8], fields: FieldSet) -> Result<ClientHelloInfo, ParseError> {
    if raw.len() < RECORD_HEADER_LEN {
        return Err(ParseError::TooShort(raw.len()));
    }

    // Verify this is a Handshake record (content type 0x16)
    if raw[0] != CONTENT_TYPE_HANDSHAKE {
        return Err(ParseError::NotHandshakeRecord(raw[0]));
    }

    match raw.get(RECORD_HEADER_LEN) {
        None => return Err(ParseError::TruncatedField("handshake type")),
        Some(&t) if t != HANDSHAKE_CLIENT_HELLO => return Err(ParseError::NotClientHello(t)),
        Some(_) => {}
    }

    let mut record = Reader::new(raw);
    record.u8("content type")?;
    let record_version = record.u16("record version")?;
    let fragment_len = record.u16("record length")? as usize;
    let mut fragment = Reader::new(record.take(fragment_len, "record fragment")?);

    let handshake_type = fragment.u8("handshake type")?;
    let body_len = fragment.u24("handshake length")?;
    let mut body = Reader::new(fragment.take(body_len, "handshake body")?);

    let tls_version = body.u16("client version")?;
    body.take(RANDOM_LEN, "random")?;
    let session_id_len = body.u8("session id length")? as usize;
    body.take(session_id_len, "session id")?;

    let cipher_len = body.u16("cipher suites length")? as usize;
    let cipher_suites = u16_codes(body.take(cipher_len, "cipher suites")?, "cipher suites")?;

    let compression_len = body.u8("compression methods length")? as usize;
    body.take(compression_len, "compression methods")?;

    let mut info = ClientHelloInfo {
        record_version,
        tls_version,
        dtls_version: 0,
        handshake_type,
        renegotiation: cipher_suites
            .iter()
            .copied()
            .filter(|c| *c == EMPTY_RENEGOTIATION_INFO_SCSV)
            .collect(),
        cipher_suites,
        extensions: Vec::new(),
        elliptic_curves: Vec::new(),
        ec_point_formats: Vec::new(),
        signature_algorithms: Vec::new(),
        unknown_extensions: Vec::new(),
    };

    // A hello without extensions may end right after the compression methods.
    if body.is_empty() {
        trace!("ClientHello carries no extensions block");
        return Ok(info);
    }

    let extensions_len = body.u16("extensions length")? as usize;
    let mut extensions = Reader::new(body.take(extensions_len, "extensions")?);

    while !extensions.is_empty() {
        let ext_type = extensions.u16("extension type")?;
        let ext_len = extensions.u16("extension length")? as usize;
        let data = extensions.take(ext_len, "extension data")?;

        info.extensions.push(ext_type);
        if !is_known_extension(ext_type) {
            info.unknown_extensions.push(ext_type);
        }

        match ext_type {
            SUPPORTED_GROUPS => {
                let groups = u16_vector(data, "supported_groups")?;
                info.elliptic_curves.extend(groups);
            }
            EC_POINT_FORMATS => {
                let mut r = Reader::new(data);
                let len = r.u8("ec_point_formats")? as usize;
                info.ec_point_formats
                    .extend_from_slice(r.take(len, "ec_point_formats")?);
            }
            SIGNATURE_ALGORITHMS if fields == FieldSet::Ja4 => {
                let algs = u16_vector(data, "signature_algorithms")?;
                info.signature_algorithms.extend(algs);
            }
            RENEGOTIATION_INFO => info.renegotiation.push(RENEGOTIATION_INFO),
            _ => {}
        }
    }

    trace!(
        "parsed ClientHello: {} suites, {} extensions",
        info.cipher_suites.len(),
        info.extensions.len()
    );
    Ok(info)
}

/// A 2-byte length prefix followed by 16-bit codes, as used by
/// `supported_groups` and `signature_algorithms`. Bytes after the list are
/// not inspected.
fn u16_vector(data: &[u8], field: &'static str) -> Result<Vec<u16>, ParseError> {
    let mut r = Reader::new(data);
    let len = r.u16(field)? as usize;
    u16_codes(r.take(len, field)?, field)
}

fn u16_codes(data: &[u8], field: &'static str) -> Result<Vec<u16>, ParseError> {
    if data.len() % 2 != 0 {
        return Err(ParseError::TruncatedField(field));
    }
    Ok(data
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::types::decimal;
    use crate::hello::builder::build_client_hello;
    use crate::hello::{ext, ClientHelloSpec, Extension, TLS1_2};

    fn spec_with(extensions: Vec<Extension>) -> ClientHelloSpec {
        ClientHelloSpec {
            version: TLS1_2,
            random: [7; 32],
            session_id: vec![9; 32],
            cipher_suites: vec![0x1301, 0x1302, 0x1303, 0xc02f, 0xc02b],
            compression_methods: vec![0],
            extensions,
        }
    }

    fn full_extensions() -> Vec<Extension> {
        vec![
            Extension::new(ext::SERVER_NAME, vec![]),
            Extension::new(ext::SUPPORTED_GROUPS, vec![0x00, 0x06, 0x00, 0x1d, 0x00, 0x17, 0x00, 0x18]),
            Extension::new(ext::EC_POINT_FORMATS, vec![0x01, 0x00]),
            Extension::new(ext::SIGNATURE_ALGORITHMS, vec![0x00, 0x04, 0x04, 0x03, 0x08, 0x04]),
            Extension::new(ext::RENEGOTIATION_INFO, vec![0x00]),
        ]
    }

    #[test]
    fn parses_cipher_suites_in_wire_order() {
        let bytes = build_client_hello(&spec_with(vec![])).unwrap();
        let info = parse_client_hello(&bytes, FieldSet::Ja3).unwrap();

        assert_eq!(
            decimal(&info.cipher_suites),
            vec!["4865", "4866", "4867", "49199", "49195"]
        );
        assert_eq!(info.tls_version, 0x0303);
        assert_eq!(info.record_version, 0x0303);
        assert_eq!(info.handshake_type, 1);
        assert_eq!(info.dtls_version, 0);
        assert!(info.extensions.is_empty());
    }

    #[test]
    fn extracts_sub_fields() {
        let bytes = build_client_hello(&spec_with(full_extensions())).unwrap();
        let info = parse_client_hello(&bytes, FieldSet::Ja4).unwrap();

        assert_eq!(info.extensions, vec![0x0000, 0x000a, 0x000b, 0x000d, 0xff01]);
        assert_eq!(info.elliptic_curves, vec![0x001d, 0x0017, 0x0018]);
        assert_eq!(info.ec_point_formats, vec![0x00]);
        assert_eq!(info.signature_algorithms, vec![0x0403, 0x0804]);
        assert_eq!(info.renegotiation, vec![0xff01]);
        assert!(info.unknown_extensions.is_empty());
    }

    #[test]
    fn signature_algorithms_only_for_ja4() {
        let bytes = build_client_hello(&spec_with(full_extensions())).unwrap();
        let info = parse_client_hello(&bytes, FieldSet::Ja3).unwrap();
        assert!(info.signature_algorithms.is_empty());
        assert!(info.extensions.contains(&ext::SIGNATURE_ALGORITHMS));
    }

    #[test]
    fn renegotiation_scsv_precedes_extension_marker() {
        let mut spec = spec_with(vec![Extension::new(ext::RENEGOTIATION_INFO, vec![0x00])]);
        spec.cipher_suites.push(ext::EMPTY_RENEGOTIATION_INFO_SCSV);
        let bytes = build_client_hello(&spec).unwrap();
        let info = parse_client_hello(&bytes, FieldSet::Ja4).unwrap();
        assert_eq!(info.renegotiation, vec![255, 65281]);
    }

    #[test]
    fn unknown_extensions_keep_wire_order() {
        let spec = spec_with(vec![
            Extension::new(0x0a0a, vec![]),
            Extension::new(ext::SERVER_NAME, vec![]),
            Extension::new(0x1234, vec![0x01]),
        ]);
        let bytes = build_client_hello(&spec).unwrap();
        let info = parse_client_hello(&bytes, FieldSet::Ja4).unwrap();
        assert_eq!(info.extensions, vec![0x0a0a, 0x0000, 0x1234]);
        assert_eq!(info.unknown_extensions, vec![0x0a0a, 0x1234]);
    }

    #[test]
    fn rejects_application_data_record() {
        let mut bytes = build_client_hello(&spec_with(vec![])).unwrap();
        bytes[0] = 0x17;
        assert_eq!(
            parse_client_hello(&bytes, FieldSet::Ja3),
            Err(ParseError::NotHandshakeRecord(0x17))
        );
    }

    #[test]
    fn rejects_short_input() {
        assert_eq!(
            parse_client_hello(&[0x16, 0x03, 0x01], FieldSet::Ja3),
            Err(ParseError::TooShort(3))
        );
        assert_eq!(
            parse_client_hello(&[0x16, 0x03, 0x01, 0x00, 0x10], FieldSet::Ja3),
            Err(ParseError::TruncatedField("handshake type"))
        );
    }

    #[test]
    fn rejects_server_hello() {
        let mut bytes = build_client_hello(&spec_with(vec![])).unwrap();
        bytes[5] = 0x02;
        assert_eq!(
            parse_client_hello(&bytes, FieldSet::Ja3),
            Err(ParseError::NotClientHello(0x02))
        );
    }

    #[test]
    fn truncated_buffer_is_rejected() {
        let mut bytes = build_client_hello(&spec_with(full_extensions())).unwrap();
        bytes.truncate(bytes.len() - 3);
        assert_eq!(
            parse_client_hello(&bytes, FieldSet::Ja4),
            Err(ParseError::TruncatedField("record fragment"))
        );
    }

    #[test]
    fn extension_length_past_block_is_rejected() {
        let spec = spec_with(vec![Extension::new(
            ext::SUPPORTED_GROUPS,
            vec![0x00, 0x04, 0x00, 0x1d, 0x00, 0x17],
        )]);
        let mut bytes = build_client_hello(&spec).unwrap();
        // Declared payload of the last extension grows from 6 to 16 bytes.
        let at = bytes.len() - 6 - 2;
        bytes[at..at + 2].copy_from_slice(&[0x00, 0x10]);

        assert_eq!(
            parse_client_hello(&bytes, FieldSet::Ja3),
            Err(ParseError::TruncatedField("extension data"))
        );
    }

    #[test]
    fn inner_list_past_extension_is_rejected() {
        let spec = spec_with(vec![Extension::new(
            ext::SUPPORTED_GROUPS,
            vec![0x00, 0x0a, 0x00, 0x1d],
        )]);
        let bytes = build_client_hello(&spec).unwrap();
        assert_eq!(
            parse_client_hello(&bytes, FieldSet::Ja3),
            Err(ParseError::TruncatedField("supported_groups"))
        );

        let spec = spec_with(vec![Extension::new(ext::EC_POINT_FORMATS, vec![0x03, 0x00])]);
        let bytes = build_client_hello(&spec).unwrap();
        assert_eq!(
            parse_client_hello(&bytes, FieldSet::Ja3),
            Err(ParseError::TruncatedField("ec_point_formats"))
        );
    }

    #[test]
    fn odd_cipher_block_is_rejected() {
        let bytes = build_client_hello(&spec_with(vec![])).unwrap();
        // Declare a 9-byte cipher block: four suites and half of a fifth.
        let at = 9 + 2 + 32 + 1 + 32;
        let mut bytes = bytes;
        bytes[at..at + 2].copy_from_slice(&[0x00, 0x09]);
        assert_eq!(
            parse_client_hello(&bytes, FieldSet::Ja3),
            Err(ParseError::TruncatedField("cipher suites"))
        );
    }

    #[test]
    fn hello_without_extensions_block() {
        let bytes = build_client_hello(&spec_with(vec![])).unwrap();
        // Drop the empty extensions block and fix up both length fields.
        let mut bytes = bytes[..bytes.len() - 2].to_vec();
        let record_len = (bytes.len() - 5) as u16;
        bytes[3..5].copy_from_slice(&record_len.to_be_bytes());
        let body_len = (bytes.len() - 9) as u32;
        bytes[6..9].copy_from_slice(&body_len.to_be_bytes()[1..]);

        let info = parse_client_hello(&bytes, FieldSet::Ja4).unwrap();
        assert_eq!(info.cipher_suites.len(), 5);
        assert!(info.extensions.is_empty());
    }

    #[test]
    fn trailing_bytes_after_record_are_ignored() {
        let mut bytes = build_client_hello(&spec_with(full_extensions())).unwrap();
        let expected = parse_client_hello(&bytes, FieldSet::Ja4).unwrap();
        bytes.extend_from_slice(&[0x17, 0x03, 0x03, 0x00, 0x00]);
        assert_eq!(parse_client_hello(&bytes, FieldSet::Ja4).unwrap(), expected);
    }

    #[test]
    fn parse_is_deterministic() {
        let bytes = build_client_hello(&spec_with(full_extensions())).unwrap();
        assert_eq!(
            parse_client_hello(&bytes, FieldSet::Ja4),
            parse_client_hello(&bytes, FieldSet::Ja4)
        );
    }
}
