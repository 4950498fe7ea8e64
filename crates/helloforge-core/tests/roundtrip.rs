//! Builder/parser round trip and fingerprint invariants over generated specs.

use helloforge_core::fingerprint::clienthello::{parse_client_hello, ParseError};
use helloforge_core::fingerprint::ja3::compute_ja3;
use helloforge_core::fingerprint::ja4::compute_ja4;
use helloforge_core::fingerprint::types::FieldSet;
use helloforge_core::hello::builder::build_client_hello;
use helloforge_core::hello::{ext, BuildError, ClientHelloSpec, Extension};
use proptest::prelude::*;

/// Extensions whose payload is opaque to the parser.
fn arb_plain_extension() -> impl Strategy<Value = Extension> {
    (
        prop_oneof![
            Just(ext::SERVER_NAME),
            Just(ext::ALPN),
            Just(ext::SESSION_TICKET),
            Just(ext::KEY_SHARE),
            Just(0x0a0au16),
            0x0100u16..0x0200,
        ],
        proptest::collection::vec(any::<u8>(), 0..24),
    )
        .prop_map(|(t, data)| Extension::new(t, data))
}

fn groups_payload(groups: &[u16]) -> Vec<u8> {
    let mut data = ((groups.len() * 2) as u16).to_be_bytes().to_vec();
    for g in groups {
        data.extend_from_slice(&g.to_be_bytes());
    }
    data
}

fn formats_payload(formats: &[u8]) -> Vec<u8> {
    let mut data = vec![formats.len() as u8];
    data.extend_from_slice(formats);
    data
}

/// A spec plus the curves and point formats it carries.
fn arb_spec() -> impl Strategy<Value = (ClientHelloSpec, Vec<u16>, Vec<u8>)> {
    (
        prop_oneof![Just(0x0301u16), Just(0x0303u16)],
        any::<[u8; 32]>(),
        proptest::collection::vec(any::<u8>(), 0..=32),
        proptest::collection::vec(any::<u16>(), 1..40),
        proptest::collection::vec(any::<u8>(), 0..4),
        proptest::collection::vec(arb_plain_extension(), 0..8),
        proptest::option::of(proptest::collection::vec(any::<u16>(), 0..8)),
        proptest::option::of(proptest::collection::vec(any::<u8>(), 0..4)),
    )
        .prop_map(
            |(version, random, session_id, cipher_suites, compression, mut extensions, groups, formats)| {
                let curves = groups.clone().unwrap_or_default();
                let point_formats = formats.clone().unwrap_or_default();
                if let Some(groups) = groups {
                    let at = extensions.len() / 2;
                    extensions.insert(at, Extension::new(ext::SUPPORTED_GROUPS, groups_payload(&groups)));
                }
                if let Some(formats) = formats {
                    extensions.push(Extension::new(ext::EC_POINT_FORMATS, formats_payload(&formats)));
                }
                let spec = ClientHelloSpec {
                    version,
                    random,
                    session_id,
                    cipher_suites,
                    compression_methods: compression,
                    extensions,
                };
                (spec, curves, point_formats)
            },
        )
}

proptest! {
    #[test]
    fn parse_recovers_built_fields((spec, curves, formats) in arb_spec()) {
        let bytes = build_client_hello(&spec).unwrap();
        let info = parse_client_hello(&bytes, FieldSet::Ja4).unwrap();

        prop_assert_eq!(info.tls_version, spec.version);
        prop_assert_eq!(&info.cipher_suites, &spec.cipher_suites);
        prop_assert_eq!(info.extensions, spec.extension_types());
        prop_assert_eq!(info.elliptic_curves, curves);
        prop_assert_eq!(info.ec_point_formats, formats);
    }

    #[test]
    fn fingerprints_ignore_nonces(
        (spec, _, _) in arb_spec(),
        random in any::<[u8; 32]>(),
        session_id in proptest::collection::vec(any::<u8>(), 0..=32),
    ) {
        let mut other = spec.clone();
        other.random = random;
        other.session_id = session_id;

        let a = parse_client_hello(&build_client_hello(&spec).unwrap(), FieldSet::Ja4).unwrap();
        let b = parse_client_hello(&build_client_hello(&other).unwrap(), FieldSet::Ja4).unwrap();

        prop_assert_eq!(compute_ja3(&a), compute_ja3(&b));
        prop_assert_eq!(compute_ja4(&a), compute_ja4(&b));
    }

    #[test]
    fn every_proper_prefix_is_rejected((spec, _, _) in arb_spec(), cut in any::<prop::sample::Index>()) {
        let bytes = build_client_hello(&spec).unwrap();
        let len = cut.index(bytes.len());
        prop_assert!(parse_client_hello(&bytes[..len], FieldSet::Ja4).is_err());
    }
}

#[test]
fn concrete_chrome_cipher_scenario() {
    let spec = ClientHelloSpec {
        version: 0x0303,
        random: [0x5a; 32],
        session_id: vec![0xa5; 32],
        cipher_suites: vec![0x1301, 0x1302, 0x1303, 0xc02f, 0xc02b],
        compression_methods: vec![0],
        extensions: vec![],
    };
    let bytes = build_client_hello(&spec).unwrap();

    assert_eq!(bytes[0], 0x16);
    assert_eq!(&bytes[1..3], &[0x03, 0x03]);
    assert_eq!(bytes[5], 0x01);

    let info = parse_client_hello(&bytes, FieldSet::Ja3).unwrap();
    let suites: Vec<String> = info.cipher_suites.iter().map(|c| c.to_string()).collect();
    assert_eq!(suites, vec!["4865", "4866", "4867", "49199", "49195"]);
}

#[test]
fn oversized_cipher_list_overflows() {
    let spec = ClientHelloSpec {
        version: 0x0303,
        random: [0; 32],
        session_id: vec![],
        cipher_suites: vec![0xc02f; 40000],
        compression_methods: vec![0],
        extensions: vec![],
    };
    assert!(matches!(
        build_client_hello(&spec),
        Err(BuildError::LengthOverflow { .. })
    ));
}

#[test]
fn application_data_is_not_a_handshake() {
    let record = [0x17, 0x03, 0x03, 0x00, 0x02, 0xde, 0xad];
    assert_eq!(
        parse_client_hello(&record, FieldSet::Ja3),
        Err(ParseError::NotHandshakeRecord(0x17))
    );
}
