use crate::error::{Result, ScanError};
use crate::host::{DomainSuffix, Host};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::redirect::Policy;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

/// Retrieves a page and returns the absolute links found on it.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, host: &Host) -> Result<HashSet<String>>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn fetch(&self, host: &Host) -> Result<HashSet<String>> {
        (**self).fetch(host).await
    }
}

const MAX_REDIRECTS: usize = 5;

/// reqwest + scraper backed fetcher.
///
/// A fetcher scoped to a domain suffix refuses redirects that leave it, so
/// links on pages outside the suffix never reach the crawl.
pub struct HttpFetcher {
    client: Client,
    suffix: Option<DomainSuffix>,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(10)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        Self::build(timeout_secs, None)
    }

    /// Fetcher that only follows redirects to hosts under `suffix`.
    pub fn for_suffix(suffix: DomainSuffix, timeout_secs: u64) -> Result<Self> {
        Self::build(timeout_secs, Some(suffix))
    }

    fn build(timeout_secs: u64, suffix: Option<DomainSuffix>) -> Result<Self> {
        let redirect_policy = match suffix.clone() {
            Some(suffix) => Policy::custom(move |attempt| {
                let in_domain = Host::from_url(attempt.url())
                    .map(|host| suffix.matches(&host))
                    .unwrap_or(false);
                if attempt.previous().len() >= MAX_REDIRECTS {
                    attempt.error("too many redirects")
                } else if in_domain {
                    attempt.follow()
                } else {
                    attempt.stop()
                }
            }),
            None => Policy::limited(MAX_REDIRECTS),
        };

        let client = Client::builder()
            .user_agent(concat!("hostcrawl/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(redirect_policy)
            .build()?;

        Ok(Self { client, suffix })
    }

    /// Fetch any URL and collect its outbound links.
    ///
    /// Non-2xx responses are still parsed; only transport failures and
    /// redirects out of the suffix are errors.
    pub async fn fetch_url(&self, url: &str) -> Result<HashSet<String>> {
        debug!("Fetching {}", url);

        let start = Instant::now();
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let final_url = response.url().clone();

        if self.suffix.is_some() && status.is_redirection() {
            // The redirect policy stopped here, so the target is off-domain.
            let target = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|location| final_url.join(location).ok())
                .map(|target| target.to_string())
                .unwrap_or_default();
            debug!("Refusing redirect {} -> {}", final_url, target);
            return Err(ScanError::OffDomainRedirect {
                from: final_url.to_string(),
                to: target,
            });
        }

        let requested_host = Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_owned));
        if requested_host.as_deref() != final_url.host_str() {
            debug!("Detected redirect: {} -> {}", url, final_url);
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(true);

        let body = response.text().await?;
        debug!(
            "{} -> {} ({}, {} bytes, {:?})",
            url,
            final_url,
            status.as_u16(),
            body.len(),
            start.elapsed()
        );

        if !is_html {
            return Ok(HashSet::new());
        }

        Ok(extract_links(&body, &final_url))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, host: &Host) -> Result<HashSet<String>> {
        self.fetch_url(host.as_str()).await
    }
}

/// Collect every `a[href]` on the page as an absolute URL.
pub fn extract_links(html: &str, base: &Url) -> HashSet<String> {
    let document = Html::parse_document(html);
    let Ok(link_selector) = Selector::parse("a[href]") else {
        return HashSet::new();
    };

    document
        .select(&link_selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_url(base, href))
        .collect()
}

fn resolve_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    // Skip empty, javascript:, mailto:, tel:, etc.
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    url.set_fragment(None);

    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn base() -> Url {
        Url::parse("https://web.mit.edu/research/").unwrap()
    }

    #[test]
    fn test_extract_links_resolves_relative() {
        let html = r#"<html><body>
            <a href="https://eecs.mit.edu/people">EECS</a>
            <a href="/about">About</a>
            <a href="labs">Labs</a>
            <a href="//news.mit.edu/2024">News</a>
        </body></html>"#;

        let links = extract_links(html, &base());

        assert!(links.contains("https://eecs.mit.edu/people"));
        assert!(links.contains("https://web.mit.edu/about"));
        assert!(links.contains("https://web.mit.edu/research/labs"));
        assert!(links.contains("https://news.mit.edu/2024"));
        assert_eq!(links.len(), 4);
    }

    #[test]
    fn test_extract_links_skips_non_navigational() {
        let html = r##"<html><body>
            <a href="">Empty</a>
            <a href="#top">Top</a>
            <a href="javascript:void(0)">JS</a>
            <a href="mailto:help@mit.edu">Mail</a>
            <a href="tel:+16172531000">Call</a>
            <a>No href</a>
            <a href="https://ocw.mit.edu/#courses">OCW</a>
        </body></html>"##;

        let links = extract_links(html, &base());

        assert_eq!(links.len(), 1);
        assert!(links.contains("https://ocw.mit.edu/"));
    }

    #[tokio::test]
    async fn test_fetch_url_collects_links() {
        let mock_server = MockServer::start().await;

        let root_html = format!(
            r#"<html><body>
                <a href="{}/page1">Page 1</a>
                <a href="https://web.mit.edu/">Web</a>
            </body></html>"#,
            mock_server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(root_html.as_bytes()),
            )
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let links = fetcher.fetch_url(&mock_server.uri()).await.unwrap();

        assert!(links.contains(&format!("{}/page1", mock_server.uri())));
        assert!(links.contains("https://web.mit.edu/"));
        assert_eq!(links.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_url_parses_error_pages() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(br#"<a href="https://help.mit.edu/">Help</a>"#.as_slice()),
            )
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let links = fetcher
            .fetch_url(&format!("{}/missing", mock_server.uri()))
            .await
            .unwrap();

        assert!(links.contains("https://help.mit.edu/"));
    }

    #[tokio::test]
    async fn test_fetch_url_ignores_non_html() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_bytes(br#"{"href": "<a href='https://web.mit.edu'>x</a>"}"#.as_slice()),
            )
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let links = fetcher
            .fetch_url(&format!("{}/data.json", mock_server.uri()))
            .await
            .unwrap();

        assert!(links.is_empty());
    }

    // The mock server listens on 127.0.0.1, which sits under this suffix;
    // `localhost` does not.
    fn loopback_suffix() -> DomainSuffix {
        DomainSuffix::new("0.0.1").unwrap()
    }

    #[tokio::test]
    async fn test_redirect_within_suffix_is_followed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", format!("{}/new", mock_server.uri())),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(br#"<a href="https://eecs.mit.edu/">EECS</a>"#.as_slice()),
            )
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::for_suffix(loopback_suffix(), 5).unwrap();
        let links = fetcher
            .fetch_url(&format!("{}/old", mock_server.uri()))
            .await
            .unwrap();

        assert!(links.contains("https://eecs.mit.edu/"));
    }

    #[tokio::test]
    async fn test_redirect_outside_suffix_is_refused() {
        let mock_server = MockServer::start().await;
        let port = mock_server.address().port();

        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", format!("http://localhost:{}/landing", port)),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/landing"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(br#"<a href="https://web.mit.edu/">Web</a>"#.as_slice()),
            )
            .expect(0)
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::for_suffix(loopback_suffix(), 5).unwrap();
        let result = fetcher.fetch_url(&format!("{}/old", mock_server.uri())).await;

        match result {
            Err(ScanError::OffDomainRedirect { to, .. }) => {
                assert_eq!(to, format!("http://localhost:{}/landing", port));
            }
            other => panic!("expected OffDomainRedirect, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host_is_error() {
        let fetcher = HttpFetcher::with_timeout(2).unwrap();
        // Port 9 (discard) on localhost is expected to refuse connections.
        let result = fetcher.fetch_url("http://127.0.0.1:9/").await;
        assert!(result.is_err());
    }
}
