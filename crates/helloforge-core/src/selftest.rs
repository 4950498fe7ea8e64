//! Build → parse → fingerprint → compare against what a template recorded.

use serde::Serialize;
use tracing::debug;

use crate::fingerprint::fingerprint_record;
use crate::fingerprint::ja3::Ja3Components;
use crate::fingerprint::ja4::Ja4Components;
use crate::template::{BrowserTemplate, TemplateError};

/// Outcome of re-deriving a template's fingerprints.
#[derive(Debug, Clone, Serialize)]
pub struct Verification {
    pub ja3: String,
    pub ja4: String,
    pub ja3_match: bool,
    pub ja4_match: bool,
    /// Labels of JA4 segments that differ from the stored fingerprint. Empty
    /// when the stored value is not a parseable JA4 string.
    pub ja4_segment_diffs: Vec<char>,
    /// JA3 fields in which an echoed raw string departs from the ClientHello
    /// that was sent. Empty for a local check.
    pub ja3_field_diffs: Vec<&'static str>,
}

impl Verification {
    pub fn passed(&self) -> bool {
        self.ja3_match && self.ja4_match
    }
}

pub fn verify_template(template: &BrowserTemplate) -> Result<Verification, TemplateError> {
    let bytes = template.client_hello_bytes()?;
    let fp = fingerprint_record(&bytes)?;
    Ok(compare(template, &fp.ja3.hash, &fp.ja4.fingerprint))
}

/// Compare fingerprints obtained elsewhere (e.g. echoed back by a server)
/// against the template's stored values.
pub fn compare(template: &BrowserTemplate, ja3: &str, ja4: &str) -> Verification {
    let ja4_segment_diffs = match (
        Ja4Components::parse(&template.ja4_fingerprint),
        Ja4Components::parse(ja4),
    ) {
        (Ok(stored), Ok(observed)) => stored.differing_segments(&observed),
        (Err(e), _) | (_, Err(e)) => {
            debug!("JA4 not comparable segment-wise: {}", e);
            Vec::new()
        }
    };

    Verification {
        ja3: ja3.to_string(),
        ja4: ja4.to_string(),
        ja3_match: ja3 == template.ja3_fingerprint,
        ja4_match: ja4 == template.ja4_fingerprint,
        ja4_segment_diffs,
        ja3_field_diffs: Vec::new(),
    }
}

/// [`compare`] for fingerprints echoed by a server, also locating the JA3
/// fields where the server's raw string differs from what the template sends.
pub fn compare_echoed(
    template: &BrowserTemplate,
    ja3: &str,
    ja3_raw: &str,
    ja4: &str,
) -> Result<Verification, TemplateError> {
    let sent = fingerprint_record(&template.client_hello_bytes()?)?;
    let mut verification = compare(template, ja3, ja4);

    match Ja3Components::parse(ja3_raw) {
        Ok(echoed) => {
            verification.ja3_field_diffs =
                Ja3Components::from_info(&sent.info).differing_fields(&echoed);
        }
        Err(e) => debug!("JA3 not comparable field-wise: {}", e),
    }
    Ok(verification)
}
