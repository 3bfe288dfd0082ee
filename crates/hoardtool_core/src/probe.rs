use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;

pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_USER_AGENT: &str = "hoardtool/0.2";

/// Decides whether a URL answers a lightweight existence check.
pub trait ReachabilityProbe {
    fn is_reachable(&self, url: &str) -> bool;
}

impl<F> ReachabilityProbe for F
where
    F: Fn(&str) -> bool,
{
    fn is_reachable(&self, url: &str) -> bool {
        self(url)
    }
}

/// Accepts every well-formed URL without touching the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipProbe;

impl ReachabilityProbe for SkipProbe {
    fn is_reachable(&self, _url: &str) -> bool {
        true
    }
}

/// HEAD request with a fixed timeout. Redirects are not followed, so a 3xx
/// answer counts as reachable. Statuses >= 400 and transport errors count as
/// unreachable.
pub struct HttpProbe {
    client: Client,
    user_agent: String,
}

impl HttpProbe {
    pub fn new(timeout: Duration, user_agent: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()
            .context("failed to build reachability HTTP client")?;
        Ok(Self {
            client,
            user_agent: user_agent.into(),
        })
    }
}

impl ReachabilityProbe for HttpProbe {
    fn is_reachable(&self, url: &str) -> bool {
        let response = self
            .client
            .head(url)
            .header("User-Agent", self.user_agent.clone())
            .send();
        match response {
            Ok(response) => {
                let status = response.status();
                tracing::debug!(url, status = status.as_u16(), "probe answered");
                status.as_u16() < 400
            }
            Err(error) => {
                tracing::debug!(url, %error, "probe failed");
                false
            }
        }
    }
}

/// Absolute http(s) URL with a host.
pub fn is_well_formed(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    matches!(parsed.scheme(), "http" | "https")
        && parsed.host_str().is_some_and(|host| !host.is_empty())
}

/// Source of the `createdAt` timestamp.
pub trait Clock {
    fn now_unix(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|value| i64::try_from(value.as_secs()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_unix(&self) -> i64 {
        self.0
    }
}
