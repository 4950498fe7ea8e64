use crate::fingerprint::ja3::md5_hex;
use crate::fingerprint::types::{join_decimal, ClientHelloInfo, Ja4Result};

/// Segment labels in canonical order.
pub const SEGMENT_LABELS: [char; 10] = ['t', 'd', 'h', 'c', 'e', 'g', 'p', 'a', 'r', 'u'];

const DIGEST_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed JA4 string: {0}")]
pub struct Ja4FormatError(String);

/// The ten labelled JA4 segments, value only (label stripped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ja4Components {
    values: [String; 10],
    digest: Option<String>,
}

impl Ja4Components {
    pub fn from_info(info: &ClientHelloInfo) -> Self {
        Self {
            values: [
                info.tls_version.to_string(),
                info.dtls_version.to_string(),
                info.handshake_type.to_string(),
                join_decimal(&info.cipher_suites, "-"),
                join_decimal(&info.extensions, "-"),
                join_decimal(&info.elliptic_curves, "-"),
                join_decimal(&info.ec_point_formats, "-"),
                join_decimal(&info.signature_algorithms, "-"),
                join_decimal(&info.renegotiation, "-"),
                join_decimal(&info.unknown_extensions, "-"),
            ],
            digest: None,
        }
    }

    /// Decode a canonical string, or a full fingerprint with its trailing
    /// digest, back into segments. Segments must appear in canonical order.
    pub fn parse(s: &str) -> Result<Self, Ja4FormatError> {
        let mut parts: Vec<&str> = s.split('_').collect();

        let digest = parts
            .last()
            .filter(|last| last.len() == DIGEST_LEN && last.chars().all(|c| c.is_ascii_hexdigit()))
            .map(|last| last.to_ascii_lowercase());
        if digest.is_some() {
            parts.pop();
        }

        if parts.len() != SEGMENT_LABELS.len() {
            return Err(Ja4FormatError(format!(
                "expected {} segments, found {}",
                SEGMENT_LABELS.len(),
                parts.len()
            )));
        }

        let mut values: [String; 10] = Default::default();
        for ((value, part), label) in values.iter_mut().zip(&parts).zip(SEGMENT_LABELS) {
            let rest = part
                .strip_prefix(label)
                .ok_or_else(|| Ja4FormatError(format!("segment {part:?} should start with '{label}'")))?;
            *value = rest.to_string();
        }

        Ok(Self { values, digest })
    }

    /// Value of the segment with the given label.
    pub fn segment(&self, label: char) -> Option<&str> {
        SEGMENT_LABELS
            .iter()
            .position(|l| *l == label)
            .map(|i| self.values[i].as_str())
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// `t771_d0_h1_c..._u...`
    pub fn canonical(&self) -> String {
        SEGMENT_LABELS
            .iter()
            .zip(&self.values)
            .map(|(label, value)| format!("{label}{value}"))
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Labels of the segments whose values differ.
    pub fn differing_segments(&self, other: &Self) -> Vec<char> {
        SEGMENT_LABELS
            .iter()
            .zip(self.values.iter().zip(&other.values))
            .filter(|(_, (a, b))| a != b)
            .map(|(label, _)| *label)
            .collect()
    }
}

/// Compute the JA4 fingerprint from a parsed ClientHello.
///
/// Canonical string: `t{ver}_d{dtls}_h{type}_c{..}_e{..}_g{..}_p{..}_a{..}_r{..}_u{..}`
/// with dash-joined decimal lists in wire order. The fingerprint appends
/// `_` and the MD5 of the canonical string.
pub fn compute_ja4(info: &ClientHelloInfo) -> Ja4Result {
    let raw = Ja4Components::from_info(info).canonical();
    let digest = md5_hex(&raw);

    Ja4Result {
        fingerprint: format!("{raw}_{digest}"),
        raw,
        digest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_info() -> ClientHelloInfo {
        ClientHelloInfo {
            record_version: 0x0301,
            tls_version: 0x0303,
            dtls_version: 0,
            handshake_type: 1,
            cipher_suites: vec![0x1302, 0x1301, 0x00ff],
            extensions: vec![
                0x0a0a, // GREASE
                0x0000, // SNI
                0x000a, // supported_groups
                0x000b, // ec_point_formats
                0x000d, // signature_algorithms
                0xff01, // renegotiation_info
            ],
            elliptic_curves: vec![0x001d, 0x0017],
            ec_point_formats: vec![0x00],
            signature_algorithms: vec![0x0403, 0x0804],
            renegotiation: vec![0x00ff, 0xff01],
            unknown_extensions: vec![0x0a0a],
        }
    }

    #[test]
    fn test_ja4_canonical_string() {
        let result = compute_ja4(&sample_info());
        assert_eq!(
            result.raw,
            "t771_d0_h1_c4866-4865-255_e2570-0-10-11-13-65281_g29-23_p0_a1027-2052_r255-65281_u2570"
        );
    }

    #[test]
    fn test_ja4_fingerprint_appends_digest() {
        let result = compute_ja4(&sample_info());
        assert_eq!(result.digest, md5_hex(&result.raw));
        assert_eq!(result.fingerprint, format!("{}_{}", result.raw, result.digest));
        assert_eq!(result.digest.len(), 32);
    }

    #[test]
    fn test_ja4_empty_lists() {
        let mut info = sample_info();
        info.cipher_suites.clear();
        info.extensions.clear();
        info.elliptic_curves.clear();
        info.ec_point_formats.clear();
        info.signature_algorithms.clear();
        info.renegotiation.clear();
        info.unknown_extensions.clear();

        assert_eq!(compute_ja4(&info).raw, "t771_d0_h1_c_e_g_p_a_r_u");
    }

    #[test]
    fn test_ja4_keeps_wire_order() {
        let mut reordered = sample_info();
        reordered.cipher_suites.reverse();
        assert_ne!(compute_ja4(&sample_info()), compute_ja4(&reordered));
    }

    #[test]
    fn test_parse_round_trips_fingerprint() {
        let result = compute_ja4(&sample_info());
        let parsed = Ja4Components::parse(&result.fingerprint).unwrap();

        assert_eq!(parsed.canonical(), result.raw);
        assert_eq!(parsed.digest(), Some(result.digest.as_str()));
        assert_eq!(parsed.segment('c'), Some("4866-4865-255"));
        assert_eq!(parsed.segment('u'), Some("2570"));
        assert_eq!(parsed.segment('x'), None);
    }

    #[test]
    fn test_parse_without_digest() {
        let parsed = Ja4Components::parse("t771_d0_h1_c4865_e_g_p_a_r_u").unwrap();
        assert_eq!(parsed.digest(), None);
        assert_eq!(parsed.segment('t'), Some("771"));
        assert_eq!(parsed.segment('e'), Some(""));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Ja4Components::parse("t13d1516h2_8daaf6152771_e5627efa2ab1").is_err());
        assert!(Ja4Components::parse("t771_d0_h1_e4865_c_g_p_a_r_u").is_err());
        assert!(Ja4Components::parse("").is_err());
    }

    #[test]
    fn test_differing_segments() {
        let a = Ja4Components::from_info(&sample_info());
        let mut other = sample_info();
        other.elliptic_curves.push(0x0018);
        other.signature_algorithms.clear();
        let b = Ja4Components::from_info(&other);

        assert_eq!(a.differing_segments(&b), vec!['g', 'a']);
        assert!(a.differing_segments(&a).is_empty());
    }
}
