use md5::{Digest, Md5};

use crate::fingerprint::types::{join_decimal, ClientHelloInfo, Ja3Result};

/// JA3 field names, in string order.
pub const JA3_FIELDS: [&str; 5] = ["version", "ciphers", "extensions", "curves", "point_formats"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed JA3 string: {0}")]
pub struct Ja3FormatError(String);

/// Compute the JA3 fingerprint from a parsed ClientHello.
///
/// JA3 format: MD5(SSLVersion,Ciphers,Extensions,EllipticCurves,EcPointFormats)
///
/// - Fields separated by commas, values within each field separated by commas
/// - All values in decimal, in wire order
/// - An empty field stays in place as an empty string
pub fn compute_ja3(info: &ClientHelloInfo) -> Ja3Result {
    let raw_string = [
        info.tls_version.to_string(),
        join_decimal(&info.cipher_suites, ","),
        join_decimal(&info.extensions, ","),
        join_decimal(&info.elliptic_curves, ","),
        join_decimal(&info.ec_point_formats, ","),
    ]
    .join(",");

    let hash = md5_hex(&raw_string);

    Ja3Result { hash, raw_string }
}

/// The numbers behind a JA3 string.
///
/// Values inside a field share the field separator, so a decoded string only
/// yields the version and the flat run of list values. Field boundaries are
/// known when the components come from a parsed ClientHello.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ja3Components {
    pub version: u16,
    pub values: Vec<u16>,
    field_lens: Option<[usize; 4]>,
}

impl Ja3Components {
    pub fn from_info(info: &ClientHelloInfo) -> Self {
        let mut values = Vec::new();
        values.extend_from_slice(&info.cipher_suites);
        values.extend_from_slice(&info.extensions);
        values.extend_from_slice(&info.elliptic_curves);
        values.extend(info.ec_point_formats.iter().map(|f| u16::from(*f)));
        Self {
            version: info.tls_version,
            values,
            field_lens: Some([
                info.cipher_suites.len(),
                info.extensions.len(),
                info.elliptic_curves.len(),
                info.ec_point_formats.len(),
            ]),
        }
    }

    /// Decode a raw (unhashed) JA3 string.
    pub fn parse(s: &str) -> Result<Self, Ja3FormatError> {
        let parts: Vec<&str> = s.trim().split(',').collect();
        if parts.len() < JA3_FIELDS.len() {
            return Err(Ja3FormatError(format!(
                "expected at least {} comma-separated parts, found {}",
                JA3_FIELDS.len(),
                parts.len()
            )));
        }

        let version = parts[0]
            .parse::<u16>()
            .map_err(|_| Ja3FormatError(format!("bad version {:?}", parts[0])))?;

        // Only an empty field leaves an empty part behind.
        let empty = parts[1..].iter().filter(|p| p.is_empty()).count();
        if empty > JA3_FIELDS.len() - 1 {
            return Err(Ja3FormatError(format!("{} empty fields", empty)));
        }

        let values = parts[1..]
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| {
                p.parse::<u16>()
                    .map_err(|_| Ja3FormatError(format!("bad value {:?}", p)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            version,
            values,
            field_lens: None,
        })
    }

    /// Names of the fields in which `other` departs from `self`.
    ///
    /// List fields are located from the first and last differing values,
    /// using whichever side knows its field boundaries. When neither side
    /// does, every list field is reported once the values differ.
    pub fn differing_fields(&self, other: &Self) -> Vec<&'static str> {
        let mut diffs = Vec::new();
        if self.version != other.version {
            diffs.push(JA3_FIELDS[0]);
        }
        if self.values == other.values {
            return diffs;
        }

        let (reference, observed, lens) = match (self.field_lens, other.field_lens) {
            (Some(lens), _) => (&self.values, &other.values, lens),
            (None, Some(lens)) => (&other.values, &self.values, lens),
            (None, None) => {
                diffs.extend_from_slice(&JA3_FIELDS[1..]);
                return diffs;
            }
        };

        let prefix = reference
            .iter()
            .zip(observed)
            .take_while(|(a, b)| a == b)
            .count();
        let suffix = reference
            .iter()
            .rev()
            .zip(observed.iter().rev())
            .take(reference.len().min(observed.len()) - prefix)
            .take_while(|(a, b)| a == b)
            .count();
        let (start, end) = (prefix, reference.len() - suffix);

        let mut offset = 0;
        for (name, len) in JA3_FIELDS[1..].iter().zip(lens) {
            let span = offset..offset + len;
            offset = span.end;
            let touched = if start < end {
                // Values replaced or removed inside the reference.
                len > 0 && span.start < end && start < span.end
            } else {
                // Values inserted at `start`: charge the field that ends there.
                (span.start < start && start <= span.end) || (start == 0 && span.start == 0)
            };
            if touched {
                diffs.push(*name);
                if start == end {
                    break;
                }
            }
        }
        diffs
    }
}

/// Lowercase hex MD5 of `input`.
pub(crate) fn md5_hex(input: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
