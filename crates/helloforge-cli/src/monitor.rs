//! Periodic Chrome Stable polling with optional template generation.

use std::collections::HashSet;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use helloforge_core::profile::{BrowserVersion, ProfileRegistry};
use helloforge_core::template::{TemplateError, TemplateStore};

use crate::discovery::Discovery;
use crate::generate::build_template;

pub const MIN_INTERVAL: Duration = Duration::from_secs(60);

/// Parse `90s`, `30m`, `1h30m`, `2d`. A bare number is seconds.
pub fn parse_interval(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        anyhow::bail!("Empty interval");
    }
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total = 0u64;
    let mut digits = String::new();
    for c in s.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let unit = match c {
            's' => 1,
            'm' => 60,
            'h' => 3600,
            'd' => 86_400,
            _ => anyhow::bail!("Invalid interval '{}': unknown unit '{}'", s, c),
        };
        let n: u64 = digits
            .parse()
            .with_context(|| format!("Invalid interval '{}': missing number before '{}'", s, c))?;
        total = n
            .checked_mul(unit)
            .and_then(|v| total.checked_add(v))
            .with_context(|| format!("Interval '{}' is too large", s))?;
        digits.clear();
    }
    if !digits.is_empty() {
        anyhow::bail!("Invalid interval '{}': trailing number without unit", s);
    }
    Ok(Duration::from_secs(total))
}

/// Result of one poll.
#[derive(Debug)]
pub enum CheckOutcome {
    New {
        version: BrowserVersion,
        template: Option<PathBuf>,
    },
    Unchanged(BrowserVersion),
}

pub struct Monitor {
    discovery: Discovery,
    registry: ProfileRegistry,
    /// Present when new versions get a template.
    store: Option<TemplateStore>,
    server_name: String,
    known: HashSet<BrowserVersion>,
}

impl Monitor {
    pub fn new(
        discovery: Discovery,
        registry: ProfileRegistry,
        store: Option<TemplateStore>,
        server_name: String,
    ) -> Self {
        Self {
            discovery,
            registry,
            store,
            server_name,
            known: HashSet::new(),
        }
    }

    pub async fn check_once(&mut self) -> Result<CheckOutcome> {
        let latest = self
            .discovery
            .latest_stable()
            .await
            .context("Failed to get latest version")?;
        Ok(self.record(latest))
    }

    fn record(&mut self, version: BrowserVersion) -> CheckOutcome {
        if !self.known.insert(version) {
            return CheckOutcome::Unchanged(version);
        }

        let template = match &self.store {
            Some(store) => match self.generate(store, &version) {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Failed to generate template for {}: {:#}", version, e);
                    None
                }
            },
            None => None,
        };
        CheckOutcome::New { version, template }
    }

    fn generate(&self, store: &TemplateStore, version: &BrowserVersion) -> Result<PathBuf> {
        let template = build_template(&self.registry, version, &self.server_name)?;
        match store.save(&template, false) {
            Ok(path) => Ok(path),
            Err(TemplateError::AlreadyExists(path)) => {
                info!("Template already present: {}", path.display());
                Ok(path)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Poll until Ctrl+C. The first check runs immediately.
    pub async fn run(self, interval: Duration) -> Result<()> {
        self.run_until(interval, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Poll until `shutdown` completes.
    pub async fn run_until<F>(mut self, interval: Duration, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        if interval < MIN_INTERVAL {
            anyhow::bail!("interval must be at least 1 minute");
        }

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.check_once().await {
                        Ok(outcome) => report(&outcome),
                        Err(e) => warn!("Check failed: {:#}", e),
                    }
                }
                _ = &mut shutdown => {
                    info!("Monitor stopped");
                    return Ok(());
                }
            }
        }
    }
}

fn report(outcome: &CheckOutcome) {
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    match outcome {
        CheckOutcome::New { version, template } => {
            println!("[{}] New Chrome version detected: {}", now, version);
            if let Some(path) = template {
                println!("[{}] Template generated: {}", now, path.display());
            }
        }
        CheckOutcome::Unchanged(version) => {
            println!("[{}] No new versions (latest: {})", now, version);
        }
    }
}
