use anyhow::{Context, Result};
use rand::RngCore;

use helloforge_core::profile::{BrowserVersion, HelloParams, ProfileRegistry};
use helloforge_core::template::BrowserTemplate;

/// Fresh per-connection values: random, a 32-byte session id and an x25519
/// key share placeholder.
pub fn random_params(server_name: &str) -> HelloParams {
    let mut rng = rand::thread_rng();

    let mut random = [0u8; 32];
    rng.fill_bytes(&mut random);
    let mut session_id = vec![0u8; 32];
    rng.fill_bytes(&mut session_id);
    let mut key_share = [0u8; 32];
    rng.fill_bytes(&mut key_share);

    HelloParams {
        random,
        session_id,
        server_name: server_name.to_string(),
        key_share,
    }
}

/// Build a template for `version` from the registry profile of its major.
pub fn build_template(
    registry: &ProfileRegistry,
    version: &BrowserVersion,
    server_name: &str,
) -> Result<BrowserTemplate> {
    let label = version.to_string();
    let profile = registry.lookup(&label).with_context(|| {
        let known: Vec<String> = registry.majors().map(|m| m.to_string()).collect();
        format!("No profile for Chrome {} (known majors: {})", label, known.join(", "))
    })?;

    let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let template = BrowserTemplate::generate(&label, profile, &random_params(server_name), timestamp)
        .with_context(|| format!("Failed to generate template for Chrome {}", label))?;
    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use helloforge_core::selftest::verify_template;

    #[test]
    fn generated_template_verifies() {
        let registry = ProfileRegistry::builtin();
        let version: BrowserVersion = "120.0.6099.109".parse().unwrap();
        let template = build_template(&registry, &version, "example.org").unwrap();

        assert_eq!(template.version, "120.0.6099.109");
        assert!(template.timestamp.ends_with('Z'));
        assert!(verify_template(&template).unwrap().passed());
    }

    #[test]
    fn fingerprints_do_not_depend_on_nonces() {
        let registry = ProfileRegistry::builtin();
        let version: BrowserVersion = "120.0.6099.109".parse().unwrap();
        let a = build_template(&registry, &version, "example.org").unwrap();
        let b = build_template(&registry, &version, "example.org").unwrap();

        assert_ne!(a.client_hello.random, b.client_hello.random);
        assert_eq!(a.ja3_fingerprint, b.ja3_fingerprint);
        assert_eq!(a.ja4_fingerprint, b.ja4_fingerprint);
    }

    #[test]
    fn unknown_major_is_reported() {
        let registry = ProfileRegistry::builtin();
        let version: BrowserVersion = "999.0.0.1".parse().unwrap();
        let err = build_template(&registry, &version, "example.org").unwrap_err();
        assert!(format!("{:#}", err).contains("known majors: 120"));
    }
}
