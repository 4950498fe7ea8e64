//! Latest Chrome Stable version lookup. Each source is one strategy; the
//! configured list is tried in order and the first valid answer wins.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use helloforge_core::profile::BrowserVersion;

use crate::config::DiscoveryConfig;

const OMAHA_URL: &str = "https://omahaproxy.appspot.com/all.json";
const RELEASES_FEED_URL: &str = "https://chromereleases.googleblog.com/feeds/posts/default";

#[async_trait]
pub trait VersionSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Raw version string as the source reports it.
    async fn fetch(&self, client: &Client) -> Result<String>;
}

/// Source names accepted in `discovery.sources`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Omaha,
    Releases,
    VersionHistory,
}

impl FromStr for SourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "omaha" => Ok(Self::Omaha),
            "releases" => Ok(Self::Releases),
            "versionhistory" => Ok(Self::VersionHistory),
            _ => anyhow::bail!(
                "Unknown version source '{}'. Expected 'omaha', 'releases' or 'versionhistory'.",
                s
            ),
        }
    }
}

impl SourceKind {
    fn build(self, platform: &str) -> Box<dyn VersionSource> {
        match self {
            Self::Omaha => Box::new(OmahaProxy {
                platform: platform.to_string(),
            }),
            Self::Releases => Box::new(ReleasesFeed),
            Self::VersionHistory => Box::new(VersionHistory {
                platform: platform.to_string(),
            }),
        }
    }
}

/// `all.json`: a flat list of `{os, channel, version}` entries.
pub struct OmahaProxy {
    platform: String,
}

#[derive(Deserialize)]
struct OmahaRelease {
    os: String,
    channel: String,
    version: String,
}

#[async_trait]
impl VersionSource for OmahaProxy {
    fn name(&self) -> &'static str {
        "omaha"
    }

    async fn fetch(&self, client: &Client) -> Result<String> {
        let body = get_text(client, OMAHA_URL).await?;
        parse_omaha(&body, &self.platform)
    }
}

fn parse_omaha(body: &str, platform: &str) -> Result<String> {
    let releases: Vec<OmahaRelease> =
        serde_json::from_str(body).context("Failed to parse omaha response")?;
    releases
        .into_iter()
        .find(|r| r.os == platform && r.channel == "stable")
        .map(|r| r.version)
        .with_context(|| format!("No stable release listed for platform {}", platform))
}

/// Chrome Releases blog feed, scanned for the first "Chrome a.b.c.d Stable".
pub struct ReleasesFeed;

#[async_trait]
impl VersionSource for ReleasesFeed {
    fn name(&self) -> &'static str {
        "releases"
    }

    async fn fetch(&self, client: &Client) -> Result<String> {
        let body = get_text(client, RELEASES_FEED_URL).await?;
        parse_releases_feed(&body)
    }
}

fn parse_releases_feed(body: &str) -> Result<String> {
    let re = Regex::new(r"Chrome (\d+\.\d+\.\d+\.\d+) Stable")?;
    re.captures(body)
        .map(|c| c[1].to_string())
        .context("No stable release found in feed")
}

/// versionhistory.googleapis.com, newest version first.
pub struct VersionHistory {
    platform: String,
}

#[derive(Deserialize)]
struct VersionList {
    #[serde(default)]
    versions: Vec<VersionEntry>,
}

#[derive(Deserialize)]
struct VersionEntry {
    version: String,
}

#[async_trait]
impl VersionSource for VersionHistory {
    fn name(&self) -> &'static str {
        "versionhistory"
    }

    async fn fetch(&self, client: &Client) -> Result<String> {
        let url = format!(
            "https://versionhistory.googleapis.com/v1/chrome/platforms/{}/channels/stable/versions",
            self.platform
        );
        let body = get_text(client, &url).await?;
        parse_version_history(&body)
    }
}

fn parse_version_history(body: &str) -> Result<String> {
    let list: VersionList =
        serde_json::from_str(body).context("Failed to parse versionhistory response")?;
    list.versions
        .into_iter()
        .next()
        .map(|v| v.version)
        .context("No versions in versionhistory response")
}

async fn get_text(client: &Client, url: &str) -> Result<String> {
    debug!("GET {}", url);
    let body = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Request to {} failed", url))?
        .error_for_status()?
        .text()
        .await?;
    Ok(body)
}

pub struct Discovery {
    client: Client,
    sources: Vec<Box<dyn VersionSource>>,
}

impl Discovery {
    pub fn new(client: Client, sources: Vec<Box<dyn VersionSource>>) -> Self {
        Self { client, sources }
    }

    pub fn from_config(config: &DiscoveryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("helloforge/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let sources = config
            .sources
            .iter()
            .map(|name| Ok(name.parse::<SourceKind>()?.build(&config.platform)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(client, sources))
    }

    /// First source that answers with a well-formed four-part version.
    pub async fn latest_stable(&self) -> Result<BrowserVersion> {
        for source in &self.sources {
            match source.fetch(&self.client).await {
                Ok(raw) => match raw.trim().parse::<BrowserVersion>() {
                    Ok(version) => {
                        debug!("{} reports Chrome {}", source.name(), version);
                        return Ok(version);
                    }
                    Err(e) => warn!("{} returned an unusable version: {}", source.name(), e),
                },
                Err(e) => warn!("{} unavailable: {:#}", source.name(), e),
            }
        }
        anyhow::bail!("Failed to get latest Chrome version from all sources")
    }
}
