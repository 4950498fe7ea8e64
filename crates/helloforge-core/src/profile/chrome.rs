use super::BrowserProfile;
use crate::hello::{ext, TLS1_2, TLS1_3};

/// ALPS (`application_settings`), old codepoint still sent by Chrome 120.
pub(super) const APPLICATION_SETTINGS: u16 = 0x4469;

/// Chrome 120 stable on desktop, GREASE omitted.
pub(super) fn chrome_120() -> BrowserProfile {
    BrowserProfile {
        name: "Chrome 120",
        major: 120,
        tls_version: TLS1_2,
        cipher_suites: vec![
            0x1301, // TLS_AES_128_GCM_SHA256
            0x1302, // TLS_AES_256_GCM_SHA384
            0x1303, // TLS_CHACHA20_POLY1305_SHA256
            0xc02b, // TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256
            0xc02f, // TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256
            0xc02c, // TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384
            0xc030, // TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384
            0xcca9, // TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256
            0xcca8, // TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256
            0xc013, // TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA
            0xc014, // TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA
            0x009c, // TLS_RSA_WITH_AES_128_GCM_SHA256
            0x009d, // TLS_RSA_WITH_AES_256_GCM_SHA384
            0x002f, // TLS_RSA_WITH_AES_128_CBC_SHA
            0x0035, // TLS_RSA_WITH_AES_256_CBC_SHA
        ],
        extensions: vec![
            ext::SERVER_NAME,
            ext::EXTENDED_MASTER_SECRET,
            ext::RENEGOTIATION_INFO,
            ext::SUPPORTED_GROUPS,
            ext::EC_POINT_FORMATS,
            ext::SESSION_TICKET,
            ext::ALPN,
            ext::STATUS_REQUEST,
            ext::SIGNATURE_ALGORITHMS,
            ext::SIGNED_CERTIFICATE_TIMESTAMP,
            ext::KEY_SHARE,
            ext::PSK_KEY_EXCHANGE_MODES,
            ext::SUPPORTED_VERSIONS,
            ext::COMPRESS_CERTIFICATE,
            APPLICATION_SETTINGS,
            ext::PADDING,
        ],
        compression_methods: vec![0x00],
        supported_groups: vec![
            0x001d, // x25519
            0x0017, // secp256r1
            0x0018, // secp384r1
        ],
        signature_algorithms: vec![
            0x0403, // ecdsa_secp256r1_sha256
            0x0804, // rsa_pss_rsae_sha256
            0x0401, // rsa_pkcs1_sha256
            0x0503, // ecdsa_secp384r1_sha384
            0x0805, // rsa_pss_rsae_sha384
            0x0501, // rsa_pkcs1_sha384
            0x0806, // rsa_pss_rsae_sha512
            0x0601, // rsa_pkcs1_sha512
        ],
        alpn_protocols: vec!["h2", "http/1.1"],
        supported_versions: vec![TLS1_3, TLS1_2],
        psk_modes: vec![0x01], // psk_dhe_ke
        cert_compression_algs: vec![0x0002], // brotli
    }
}
