//! Extension and cipher-suite code points the builder and parser care about.

pub const SERVER_NAME: u16 = 0x0000;
pub const STATUS_REQUEST: u16 = 0x0005;
pub const SUPPORTED_GROUPS: u16 = 0x000a;
pub const EC_POINT_FORMATS: u16 = 0x000b;
pub const SIGNATURE_ALGORITHMS: u16 = 0x000d;
pub const ALPN: u16 = 0x0010;
pub const SIGNED_CERTIFICATE_TIMESTAMP: u16 = 0x0012;
pub const PADDING: u16 = 0x0015;
pub const EXTENDED_MASTER_SECRET: u16 = 0x0017;
pub const COMPRESS_CERTIFICATE: u16 = 0x001b;
pub const SESSION_TICKET: u16 = 0x0023;
pub const SUPPORTED_VERSIONS: u16 = 0x002b;
pub const PSK_KEY_EXCHANGE_MODES: u16 = 0x002d;
pub const KEY_SHARE: u16 = 0x0033;
pub const RENEGOTIATION_INFO: u16 = 0xff01;

/// TLS_EMPTY_RENEGOTIATION_INFO_SCSV, the cipher-suite form of
/// `renegotiation_info`.
pub const EMPTY_RENEGOTIATION_INFO_SCSV: u16 = 0x00ff;

/// Registered name of an extension type, or `None` when the code is not one
/// this crate knows (GREASE values included).
pub fn extension_name(ext_type: u16) -> Option<&'static str> {
    let name = match ext_type {
        0x0000 => "server_name",
        0x0001 => "max_fragment_length",
        0x0002 => "client_certificate_url",
        0x0003 => "trusted_ca_keys",
        0x0004 => "truncated_hmac",
        0x0005 => "status_request",
        0x0006 => "user_mapping",
        0x0007 => "client_authz",
        0x0008 => "server_authz",
        0x0009 => "cert_type",
        0x000a => "supported_groups",
        0x000b => "ec_point_formats",
        0x000c => "srp",
        0x000d => "signature_algorithms",
        0x000e => "use_srtp",
        0x000f => "heartbeat",
        0x0010 => "application_layer_protocol_negotiation",
        0x0011 => "status_request_v2",
        0x0012 => "signed_certificate_timestamp",
        0x0013 => "client_certificate_type",
        0x0014 => "server_certificate_type",
        0x0015 => "padding",
        0x0016 => "encrypt_then_mac",
        0x0017 => "extended_master_secret",
        0x0018 => "token_binding",
        0x0019 => "cached_info",
        0x001a => "tls_lts",
        0x001b => "compress_certificate",
        0x001c => "record_size_limit",
        0x001d => "pwd_protect",
        0x001e => "pwd_clear",
        0x001f => "password_salt",
        0x0020 => "ticket_pinning",
        0x0021 => "tls_cert_with_extern_psk",
        0x0022 => "delegated_credential",
        0x0023 => "session_ticket",
        0x0024 => "tlmsp",
        0x0025 => "tlmsp_proxying",
        0x0026 => "tlmsp_delegate",
        0x0027 => "supported_ekt_ciphers",
        0x0029 => "pre_shared_key",
        0x002a => "early_data",
        0x002b => "supported_versions",
        0x002c => "cookie",
        0x002d => "psk_key_exchange_modes",
        0x002f => "certificate_authorities",
        0x0030 => "oid_filters",
        0x0031 => "post_handshake_auth",
        0x0032 => "signature_algorithms_cert",
        0x0033 => "key_share",
        0x0034 => "transparency_info",
        0x0035 | 0x0036 => "connection_id",
        0x0037 => "external_id_hash",
        0x0038 => "external_session_id",
        0x0039 => "quic_transport_parameters",
        0x003a => "ticket_request",
        0x003b => "dnssec_chain",
        0x3374 => "next_protocol_negotiation",
        0x4469 | 0x44cd => "application_settings",
        0xfe0d => "encrypted_client_hello",
        0xff01 => "renegotiation_info",
        _ => return None,
    };
    Some(name)
}

pub fn is_known_extension(ext_type: u16) -> bool {
    extension_name(ext_type).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions_have_names() {
        assert_eq!(extension_name(SUPPORTED_GROUPS), Some("supported_groups"));
        assert_eq!(extension_name(RENEGOTIATION_INFO), Some("renegotiation_info"));
        assert_eq!(extension_name(0x4469), Some("application_settings"));
    }

    #[test]
    fn grease_and_unassigned_are_unknown() {
        assert!(!is_known_extension(0x0a0a));
        assert!(!is_known_extension(0xfafa));
        assert!(!is_known_extension(0x0028)); // reserved
        assert!(!is_known_extension(0x1234));
    }
}
