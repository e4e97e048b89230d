// RESTCONF HTTP client
//
// Wraps `reqwest::Client` with controller URL construction, Basic auth,
// YANG content negotiation and lenient JSON decoding. Endpoint groups
// (topology, flows) are implemented as inherent methods in separate files
// to keep this module focused on transport mechanics.

use serde_json::Value;
use strum::{Display, EnumString};
use tracing::{debug, warn};
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::transport::TransportConfig;

// ── Request vocabulary ───────────────────────────────────────────────

/// The verbs the controller integration uses. Nothing else is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Method {
    Get,
    Put,
    Delete,
}

impl Method {
    /// Parse a method tag, failing loudly on anything unsupported.
    pub fn from_tag(tag: &str) -> Result<Self, Error> {
        tag.parse().map_err(|_| {
            Error::InvalidArgument(format!(
                "request method must be one of get, put, delete; got '{tag}'"
            ))
        })
    }

    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Content tag used for both `Content-Type` and `Accept`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ContentType {
    #[default]
    Json,
    Xml,
    Text,
}

impl ContentType {
    pub fn from_tag(tag: &str) -> Result<Self, Error> {
        tag.parse().map_err(|_| {
            Error::InvalidArgument(format!(
                "content type must be one of json, xml, text; got '{tag}'"
            ))
        })
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Json => "application/yang.data+json",
            Self::Xml => "application/xml",
            Self::Text => "text/plain",
        }
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for one controller's RESTCONF API.
///
/// Every call is a single request against `base_url + path`, authenticated
/// with Basic credentials. Successful bodies are decoded as JSON; anything
/// non-2xx becomes [`Error::HttpStatus`] and the caller decides whether a
/// 404 is acceptable.
pub struct OdlClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
}

impl OdlClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the controller root, e.g. `https://odl.example:8181`.
    pub fn new(
        base_url: &str,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, base_url, credentials)
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: &str,
        credentials: Credentials,
    ) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    /// Parse the root URL and drop any trailing slash so paths can be
    /// appended verbatim.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&path);
        Ok(url)
    }

    /// The controller base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build a full URL for a controller-relative path.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Request ──────────────────────────────────────────────────────

    /// Issue one request and decode the response.
    ///
    /// Returns `Ok(None)` for an empty or non-JSON success body; the
    /// decode failure is logged, not raised.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&str>,
        content: ContentType,
    ) -> Result<Option<Value>, Error> {
        let url = self.url(path)?;
        debug!(%method, %url, body = body.unwrap_or(""), "controller request");

        let mut req = self
            .http
            .request(method.as_reqwest(), url)
            .header(reqwest::header::CONTENT_TYPE, content.mime())
            .header(reqwest::header::ACCEPT, content.mime());
        req = self.credentials.apply(req);
        if let Some(body) = body {
            req = req.body(body.to_owned());
        }

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            debug!(%method, status = status.as_u16(), "controller rejected request");
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(None);
        }

        match serde_json::from_str(&text) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(%method, path, "can't decode controller response as JSON: {e}");
                Ok(None)
            }
        }
    }

    /// Issue a request with a JSON body.
    pub async fn request_json(
        &self,
        method: Method,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<Option<Value>, Error> {
        let payload = serde_json::to_string(body).map_err(|e| Error::Deserialization {
            message: format!("failed to serialize request body: {e}"),
            body: String::new(),
        })?;
        self.request(method, path, Some(&payload), ContentType::Json)
            .await
    }

    /// Decode an optional JSON response into a typed document.
    pub(crate) fn decode<T: serde::de::DeserializeOwned + Default>(
        value: Option<Value>,
    ) -> Result<T, Error> {
        match value {
            None => Ok(T::default()),
            Some(v) => {
                let raw = v.to_string();
                serde_json::from_value(v).map_err(|e| Error::Deserialization {
                    message: e.to_string(),
                    body: raw,
                })
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn client(base: &str) -> OdlClient {
        let creds = Credentials::new("admin", SecretString::from("admin".to_owned()));
        OdlClient::with_client(reqwest::Client::new(), base, creds).unwrap()
    }

    #[test]
    fn method_tags_are_closed() {
        assert_eq!(Method::from_tag("get").unwrap(), Method::Get);
        assert_eq!(Method::from_tag("DELETE").unwrap(), Method::Delete);
        assert!(matches!(
            Method::from_tag("post"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn content_tags_map_to_mime_types() {
        assert_eq!(ContentType::default().mime(), "application/yang.data+json");
        assert_eq!(ContentType::from_tag("xml").unwrap().mime(), "application/xml");
        assert_eq!(ContentType::from_tag("text").unwrap().mime(), "text/plain");
        assert!(ContentType::from_tag("yaml").is_err());
    }

    #[test]
    fn url_joins_with_single_slash() {
        let c = client("https://odl.example:8181/");
        let url = c.url("/restconf/config/x").unwrap();
        assert_eq!(url.as_str(), "https://odl.example:8181/restconf/config/x");
    }

    #[test]
    fn url_keeps_base_path_prefix() {
        let c = client("https://proxy.example/odl");
        let url = c.url("restconf/operational/y/").unwrap();
        assert_eq!(url.as_str(), "https://proxy.example/odl/restconf/operational/y/");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let creds = Credentials::new("admin", SecretString::from("x".to_owned()));
        assert!(matches!(
            OdlClient::with_client(reqwest::Client::new(), "not a url", creds),
            Err(Error::InvalidUrl(_))
        ));
    }
}
