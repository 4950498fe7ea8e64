use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use helloforge_core::fingerprint::Fingerprints;
use helloforge_core::hello::ext::extension_name;
use helloforge_core::selftest::Verification;
use helloforge_core::template::{version_label, BrowserTemplate};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";
const THIN_RULE: &str = "  ──────────────────────────────────────────────────";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!("Invalid output format '{}'. Expected 'text' or 'json'.", s),
        }
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn print_json_line<T: Serialize>(record: &T) -> Result<()> {
    println!("{}", serde_json::to_string(record)?);
    Ok(())
}

#[derive(Serialize)]
struct GeneratedRecord<'a> {
    timestamp: String,
    version: &'a str,
    path: String,
    ja3: &'a str,
    ja4: &'a str,
}

pub fn print_generated(template: &BrowserTemplate, path: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("{}", RULE);
            println!("  Chrome:     {}", template.version);
            println!("  Template:   {}", path.display());
            println!("{}", THIN_RULE);
            println!("  JA3:        {}", template.ja3_fingerprint);
            println!("  JA4:        {}", template.ja4_fingerprint);
            println!("{}\n", RULE);
            Ok(())
        }
        OutputFormat::Json => print_json_line(&GeneratedRecord {
            timestamp: now(),
            version: &template.version,
            path: path.display().to_string(),
            ja3: &template.ja3_fingerprint,
            ja4: &template.ja4_fingerprint,
        }),
    }
}

#[derive(Serialize)]
struct VerificationRecord<'a> {
    timestamp: String,
    /// `"local"` or the echo server address
    against: &'a str,
    version: &'a str,
    passed: bool,
    expected_ja3: &'a str,
    expected_ja4: &'a str,
    #[serde(flatten)]
    result: &'a Verification,
}

pub fn print_verification(
    template: &BrowserTemplate,
    against: &str,
    v: &Verification,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("{}", RULE);
            println!("  Chrome:     {}", template.version);
            println!("  Generated:  {}", template.timestamp);
            println!("  Checked by: {}", against);
            println!("{}", THIN_RULE);
            println!("  JA3 stored: {}", template.ja3_fingerprint);
            println!("  JA3 now:    {}", v.ja3);
            println!("  JA3 match:  {}", mark(v.ja3_match));
            if !v.ja3_field_diffs.is_empty() {
                println!("  Differs in: {}", v.ja3_field_diffs.join(", "));
            }
            println!("  JA4 stored: {}", template.ja4_fingerprint);
            println!("  JA4 now:    {}", v.ja4);
            println!("  JA4 match:  {}", mark(v.ja4_match));
            if !v.ja4_segment_diffs.is_empty() {
                let labels: Vec<String> = v.ja4_segment_diffs.iter().map(|c| c.to_string()).collect();
                println!("  Differs in: {}", labels.join(", "));
            }
            println!("{}\n", RULE);
            Ok(())
        }
        OutputFormat::Json => print_json_line(&VerificationRecord {
            timestamp: now(),
            against,
            version: &template.version,
            passed: v.passed(),
            expected_ja3: &template.ja3_fingerprint,
            expected_ja4: &template.ja4_fingerprint,
            result: v,
        }),
    }
}

fn mark(ok: bool) -> &'static str {
    if ok {
        "yes ✓"
    } else {
        "NO ✗"
    }
}

#[derive(Serialize)]
struct InspectRecord<'a> {
    timestamp: String,
    source: String,
    #[serde(flatten)]
    fingerprints: &'a Fingerprints,
}

pub fn print_inspection(
    source: &Path,
    fp: &Fingerprints,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json_line(&InspectRecord {
            timestamp: now(),
            source: source.display().to_string(),
            fingerprints: fp,
        });
    }

    let info = &fp.info;
    println!("{}", RULE);
    println!("  Source:     {}", source.display());
    println!(
        "  Record ver: 0x{:04x} ({})",
        info.record_version,
        version_label(info.record_version)
    );
    println!(
        "  TLS ver:    0x{:04x} ({})",
        info.tls_version,
        version_label(info.tls_version)
    );
    println!("  Ciphers:    {} suites", info.cipher_suites.len());
    if verbose {
        for c in &info.cipher_suites {
            println!("              0x{:04x}", c);
        }
    }
    println!("  Extensions: {} types", info.extensions.len());
    if verbose {
        for e in &info.extensions {
            let name = extension_name(*e).unwrap_or("(unknown)");
            println!("              {:<6} {}", e, name);
        }
    }
    if !info.elliptic_curves.is_empty() {
        println!("  Groups:     {}", join(&info.elliptic_curves));
    }
    if !info.ec_point_formats.is_empty() {
        println!("  Pt formats: {}", join(&info.ec_point_formats));
    }
    if !info.signature_algorithms.is_empty() {
        let algs: Vec<String> = info
            .signature_algorithms
            .iter()
            .map(|a| format!("0x{:04x}", a))
            .collect();
        println!("  Sig algs:   {}", algs.join(", "));
    }
    if !info.renegotiation.is_empty() {
        println!("  Reneg:      {}", join(&info.renegotiation));
    }
    if !info.unknown_extensions.is_empty() {
        println!("  Unknown:    {}", join(&info.unknown_extensions));
    }
    println!("{}", THIN_RULE);
    println!("  JA3:        {}", fp.ja3.hash);
    if verbose {
        println!("  JA3 raw:    {}", fp.ja3.raw_string);
    }
    println!("  JA4:        {}", fp.ja4.fingerprint);
    println!("{}\n", RULE);
    Ok(())
}

fn join<T: ToString>(values: &[T]) -> String {
    values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
}
