use crate::error::{Result, ScanError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;
use url::Url;

const SCHEME_PREFIX: &str = "https://";
const HTTPS_DEFAULT_PORT: u16 = 443;

/// A normalized origin, always of the form `https://netloc`.
///
/// The netloc is the lowercase host name, followed by `:port` when the source
/// URL carried an explicit port other than 443. Path, query, fragment and user info are
/// dropped, so two links to different pages of one site compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Host(String);

impl Host {
    /// Parse any absolute URL into its host.
    pub fn parse(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))?;
        Self::from_url(&parsed)
    }

    pub fn from_url(url: &Url) -> Result<Self> {
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ScanError::MissingHost(url.to_string()))?;

        // An explicit port is judged against the stored https form, so
        // `http://host:443` and `https://host` are the same host.
        let origin = match url.port() {
            Some(port) if port != HTTPS_DEFAULT_PORT => format!("{}{}:{}", SCHEME_PREFIX, host, port),
            _ => format!("{}{}", SCHEME_PREFIX, host),
        };
        Ok(Self(origin))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The network location, e.g. `web.mit.edu` or `web.mit.edu:8443`.
    pub fn netloc(&self) -> &str {
        &self.0[SCHEME_PREFIX.len()..]
    }

    /// The netloc without its port.
    pub fn host_name(&self) -> &str {
        split_port(self.netloc()).0
    }

    /// Short label for the host: the netloc with `suffix` stripped.
    ///
    /// Hosts outside the suffix keep their full netloc rather than losing
    /// unrelated trailing characters.
    pub fn display_label(&self, suffix: &DomainSuffix) -> String {
        let (name, port) = split_port(self.netloc());
        let stripped = match name.strip_suffix(suffix.as_str()) {
            Some(label) if !label.is_empty() => label,
            _ => {
                warn!("{} is not under {}, using full host as label", self, suffix);
                return self.netloc().to_string();
            }
        };

        match port {
            Some(port) => format!("{}:{}", stripped, port),
            None => stripped.to_string(),
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Host {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for Host {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Trailing domain that restricts which hosts a scan may reach, e.g. `.mit.edu`.
///
/// Stored lowercase with a leading dot, so `MIT.edu` and `.mit.edu` are the
/// same suffix and the bare domain itself never matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainSuffix(String);

impl DomainSuffix {
    pub fn new(suffix: &str) -> Result<Self> {
        let trimmed = suffix.trim().trim_matches('.').to_lowercase();
        if trimmed.is_empty() {
            return Err(ScanError::Other("domain suffix must not be empty".to_string()));
        }
        if trimmed.contains(|c: char| c == '/' || c == ':' || c.is_whitespace()) {
            return Err(ScanError::Other(format!("invalid domain suffix: {}", suffix)));
        }
        Ok(Self(format!(".{}", trimmed)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `host` lies under this suffix. The port, if any, is ignored.
    pub fn matches(&self, host: &Host) -> bool {
        host.host_name().ends_with(&self.0)
    }
}

impl fmt::Display for DomainSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DomainSuffix {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

fn split_port(netloc: &str) -> (&str, Option<&str>) {
    match netloc.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
            (name, Some(port))
        }
        _ => (netloc, None),
    }
}
