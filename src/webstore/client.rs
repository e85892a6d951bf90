//! Blocking HTTP client for the Web Store CRX endpoint.
//!
//! The update service answers a `response=redirect` query with a redirect
//! to the signed CRX package of the requested extension.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use chrome_extension::ExtensionId;
//! use chrome_extension::webstore::{ArchiveSource, WebStoreClient};
//!
//! # fn example() -> chrome_extension::Result<()> {
//! let client = WebStoreClient::new().with_timeout(Duration::from_secs(30));
//! let id = ExtensionId::parse("cjpalhdlnbpafiamejdnhcphjbkeiagm")?;
//! let crx = client.fetch(&id)?;
//! println!("downloaded {} bytes", crx.len());
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, info};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::ExtensionId;

// ============================================================================
// Constants
// ============================================================================

/// CRX update service endpoint.
const CRX_ENDPOINT: &str = "https://clients2.google.com/service/update2/crx";

/// Chrome version reported to the update service.
pub const DEFAULT_PRODVERSION: &str = "120.0.0.0";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default `User-Agent` header.
const DEFAULT_USER_AGENT: &str = concat!("chrome-extension/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// ArchiveSource
// ============================================================================

/// Source of packed extension archives.
///
/// [`WebStoreClient`] is the production implementation. Anything that can
/// produce CRX or ZIP bytes for an id (a local mirror, a test fixture) can
/// stand in for it.
pub trait ArchiveSource: Send + Sync {
    /// Fetches the packed archive for `id`.
    ///
    /// # Errors
    ///
    /// Implementations report transport failures and missing extensions.
    fn fetch(&self, id: &ExtensionId) -> Result<Vec<u8>>;
}

// ============================================================================
// WebStoreClient
// ============================================================================

/// Downloads extension packages from the Chrome Web Store.
#[derive(Debug, Clone)]
pub struct WebStoreClient {
    /// Chrome version sent as `prodversion`.
    prodversion: String,

    /// Whole-request timeout.
    timeout: Duration,

    /// `User-Agent` header value.
    user_agent: String,

    /// Update service override (a mirror); the Google endpoint when unset.
    endpoint: Option<Url>,
}

impl Default for WebStoreClient {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// WebStoreClient - Constructors
// ============================================================================

impl WebStoreClient {
    /// Creates a client with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            prodversion: DEFAULT_PRODVERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            endpoint: None,
        }
    }

    /// Sets the Chrome version reported to the store.
    ///
    /// Some extensions are only served to recent browser versions.
    #[inline]
    #[must_use]
    pub fn with_prodversion(mut self, prodversion: impl Into<String>) -> Self {
        self.prodversion = prodversion.into();
        self
    }

    /// Sets the request timeout.
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the `User-Agent` header.
    #[inline]
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sends requests to `endpoint` instead of the Google update service.
    ///
    /// The same query string is appended, so the endpoint must speak the
    /// update protocol. Loopback endpoints bypass any configured proxy.
    #[inline]
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }
}

// ============================================================================
// WebStoreClient - Accessors
// ============================================================================

impl WebStoreClient {
    /// Returns the configured `prodversion`.
    #[inline]
    #[must_use]
    pub fn prodversion(&self) -> &str {
        &self.prodversion
    }

    /// Returns the configured timeout.
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the endpoint override, if any.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref()
    }
}

// ============================================================================
// WebStoreClient - ArchiveSource
// ============================================================================

impl ArchiveSource for WebStoreClient {
    fn fetch(&self, id: &ExtensionId) -> Result<Vec<u8>> {
        let endpoint = match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => Url::parse(CRX_ENDPOINT)?,
        };
        let url = crx_url(endpoint, id, &self.prodversion);
        debug!(%url, "Requesting extension package");

        let mut builder = Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str());
        if is_loopback(&url) {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        let response = client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::download_failed(id.as_str(), status));
        }

        let bytes = response.bytes()?;
        info!(extension_id = %id, size = bytes.len(), "Downloaded extension package");

        Ok(bytes.to_vec())
    }
}

// ============================================================================
// Public Functions
// ============================================================================

/// Builds the CRX download URL for `id`.
///
/// # Errors
///
/// Returns [`Error::Url`] only if the endpoint constant is malformed.
///
/// # Example
///
/// ```
/// use chrome_extension::ExtensionId;
/// use chrome_extension::webstore::download_url;
///
/// let id = ExtensionId::parse("cjpalhdlnbpafiamejdnhcphjbkeiagm").unwrap();
/// let url = download_url(&id, "120.0.0.0").unwrap();
/// assert!(url.as_str().contains("x=id%3Dcjpalhdlnbpafiamejdnhcphjbkeiagm"));
/// ```
pub fn download_url(id: &ExtensionId, prodversion: &str) -> Result<Url> {
    Ok(crx_url(Url::parse(CRX_ENDPOINT)?, id, prodversion))
}

// ============================================================================
// Helpers
// ============================================================================

/// Appends the update-protocol query for `id` to `endpoint`.
fn crx_url(mut endpoint: Url, id: &ExtensionId, prodversion: &str) -> Url {
    // `x` is itself a query string and must reach the server encoded once
    let x = format!("id={}&installsource=ondemand&uc", id.as_str());

    let query = format!(
        "response=redirect&prodversion={}&acceptformat=crx2,crx3&x={}",
        urlencoding::encode(prodversion),
        urlencoding::encode(&x),
    );

    endpoint.set_query(Some(&query));
    endpoint
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        Some(url::Host::Domain(domain)) => domain == "localhost",
        None => false,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    use crate::archive::fixtures;

    /// Serves one canned HTTP response on a loopback port.
    ///
    /// The join handle yields the request line the client sent.
    fn serve_once(status: &str, body: Vec<u8>) -> (Url, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = Url::parse(&format!(
            "http://{}/service/update2/crx",
            listener.local_addr().unwrap()
        ))
        .unwrap();
        let status = status.to_string();

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                if header == "\r\n" || header.is_empty() {
                    break;
                }
            }

            let mut stream = reader.into_inner();
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            )
            .unwrap();
            stream.write_all(&body).unwrap();
            stream.flush().unwrap();

            request_line
        });

        (endpoint, handle)
    }

    fn local_client(endpoint: Url) -> WebStoreClient {
        WebStoreClient::new()
            .with_endpoint(endpoint)
            .with_timeout(Duration::from_secs(10))
    }

    fn id() -> ExtensionId {
        ExtensionId::parse("cjpalhdlnbpafiamejdnhcphjbkeiagm").unwrap()
    }

    #[test]
    fn test_download_url_shape() {
        let url = download_url(&id(), DEFAULT_PRODVERSION).unwrap();

        assert_eq!(url.host_str(), Some("clients2.google.com"));
        assert_eq!(url.path(), "/service/update2/crx");

        let query = url.query().unwrap();
        assert!(query.starts_with("response=redirect&prodversion=120.0.0.0"));
        assert!(query.contains("acceptformat=crx2,crx3"));
        assert!(
            query.ends_with("x=id%3Dcjpalhdlnbpafiamejdnhcphjbkeiagm%26installsource%3Dondemand%26uc")
        );
    }

    #[test]
    fn test_download_url_x_decodes_to_id() {
        let url = download_url(&id(), "131.0.0.0").unwrap();
        let x = url
            .query_pairs()
            .find(|(k, _)| k == "x")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert_eq!(x, "id=cjpalhdlnbpafiamejdnhcphjbkeiagm&installsource=ondemand&uc");
    }

    #[test]
    fn test_client_builder_chain() {
        let client = WebStoreClient::new()
            .with_prodversion("131.0.0.0")
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("tests");

        assert_eq!(client.prodversion(), "131.0.0.0");
        assert_eq!(client.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_default_matches_new() {
        let client = WebStoreClient::default();
        assert_eq!(client.prodversion(), DEFAULT_PRODVERSION);
        assert_eq!(client.timeout(), DEFAULT_TIMEOUT);
        assert!(client.endpoint().is_none());
    }

    #[test]
    fn test_fetch_returns_body() {
        let payload = fixtures::crx3(&fixtures::sample_extension());
        let (endpoint, server) = serve_once("200 OK", payload.clone());

        let bytes = local_client(endpoint).fetch(&id()).unwrap();
        let request_line = server.join().unwrap();

        assert_eq!(bytes, payload);
        assert!(request_line.starts_with("GET /service/update2/crx?response=redirect"));
        assert!(request_line.contains("x=id%3Dcjpalhdlnbpafiamejdnhcphjbkeiagm"));
    }

    #[test]
    fn test_fetch_not_found_is_download_failure() {
        let (endpoint, server) = serve_once("404 Not Found", Vec::new());

        let err = local_client(endpoint).fetch(&id()).unwrap_err();
        server.join().unwrap();

        assert!(err.is_network_error());
        assert!(matches!(
            err,
            Error::DownloadFailed { status, .. } if status == reqwest::StatusCode::NOT_FOUND
        ));
    }

    #[test]
    fn test_fetch_connection_refused_is_network_error() {
        let endpoint = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            Url::parse(&format!("http://{}/crx", listener.local_addr().unwrap())).unwrap()
        };

        let err = local_client(endpoint).fetch(&id()).unwrap_err();

        assert!(matches!(err, Error::Http(_)));
        assert!(err.is_network_error());
    }

    #[test]
    fn test_is_loopback() {
        assert!(is_loopback(&Url::parse("http://127.0.0.1:8080/crx").unwrap()));
        assert!(is_loopback(&Url::parse("http://localhost/crx").unwrap()));
        assert!(!is_loopback(&Url::parse(CRX_ENDPOINT).unwrap()));
    }
}
