use crate::backend::ConfigBackend;
use crate::community::{check_name, Community, OperationResult, Permission};
use crate::config::{Credentials, RunContext};
use crate::device::TransportKind;
use crate::error::{RotateKeyError, RotateKeyResult};
use crate::{HOST_META_PATH, SNMP_SERVER_RESOURCE, YANG_DATA_JSON};
use async_trait::async_trait;
use log::{debug, warn};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use quick_xml::de::from_str;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_derive::{Deserialize, Serialize};
use url::Url;

/// Everything but RFC 3986 unreserved characters is escaped in a list key,
/// so `,` and `=` cannot split or end the key.
const LIST_KEY: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestconfState {
    Unvalidated,
    Validating,
    Usable,
    Unusable,
}

/// `/.well-known/host-meta` discovery document (RFC 6415 XRD).
#[derive(Debug, Deserialize)]
struct Xrd {
    #[serde(rename = "Link", default)]
    links: Vec<XrdLink>,
}

#[derive(Debug, Deserialize)]
struct XrdLink {
    #[serde(rename = "@rel", default)]
    rel: Option<String>,
    #[serde(rename = "@href")]
    href: String,
}

impl Xrd {
    fn restconf_root(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|link| link.rel.as_deref() == Some("restconf"))
            .or_else(|| self.links.first())
            .map(|link| link.href.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CommunityConfig {
    #[serde(rename = "Cisco-IOS-XE-snmp:community-config")]
    entries: Vec<Community>,
}

/// Drives a device over RESTCONF with the Cisco IOS XE native YANG model.
pub struct RestconfBackend {
    http: Client,
    credentials: Credentials,
    base_url: Url,
    root: Option<Url>,
    state: RestconfState,
}

impl RestconfBackend {
    /// HTTPS-only client that accepts the self-signed certificates devices ship with.
    pub fn new(address: &str, ctx: &RunContext) -> RotateKeyResult<RestconfBackend> {
        let http = Client::builder()
            .timeout(ctx.http_timeout)
            .connect_timeout(ctx.connect_timeout)
            .danger_accept_invalid_certs(true)
            .https_only(true)
            .build()?;
        let base_url = Url::parse(&format!("https://{}", address))?;
        Ok(RestconfBackend::with_client(http, base_url, ctx.credentials.clone()))
    }

    /// Use a prebuilt client against an explicit base URL.
    pub fn with_client(http: Client, base_url: Url, credentials: Credentials) -> RestconfBackend {
        RestconfBackend {
            http,
            credentials,
            base_url,
            root: None,
            state: RestconfState::Unvalidated,
        }
    }

    pub fn state(&self) -> RestconfState {
        self.state
    }

    /// Working root learned from host-meta, e.g. `https://10.0.0.1/restconf`.
    pub fn root(&self) -> Option<&Url> {
        self.root.as_ref()
    }

    async fn discover(&self) -> RotateKeyResult<Url> {
        let url = self.base_url.join(HOST_META_PATH)?;
        let response = self.request(Method::GET, url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(unexpected(&response));
        }
        let body = response.text().await?;
        let xrd: Xrd = from_str(&body)?;
        let href = xrd
            .restconf_root()
            .ok_or_else(|| RotateKeyError::new("host-meta has no Link element".to_string()))?;
        Ok(self.base_url.join(href)?)
    }

    fn resource(&self, path: &str) -> RotateKeyResult<Url> {
        let root = self.root.as_ref().ok_or(RotateKeyError::NotConnected)?;
        Ok(Url::parse(&format!(
            "{}{}",
            root.as_str().trim_end_matches('/'),
            path
        ))?)
    }

    fn community_resource(&self, name: &str) -> RotateKeyResult<Url> {
        let key = utf8_percent_encode(name, LIST_KEY);
        self.resource(&format!("{}/community-config={}", SNMP_SERVER_RESOURCE, key))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .headers(yang_headers())
            .basic_auth(self.credentials.username(), Some(self.credentials.password()))
    }

    async fn fetch(&self) -> RotateKeyResult<Vec<Community>> {
        let url = self.resource(&format!("{}/community-config", SNMP_SERVER_RESOURCE))?;
        let response = self.request(Method::GET, url).send().await?;
        match response.status() {
            StatusCode::OK => {
                let config: CommunityConfig = response.json().await?;
                Ok(config.entries)
            }
            StatusCode::NO_CONTENT => Ok(Vec::new()),
            _ => Err(unexpected(&response)),
        }
    }

    async fn create(&self, name: &str, permission: Permission) -> RotateKeyResult<()> {
        check_name(name)?;
        let url = self.resource(&format!("{}/", SNMP_SERVER_RESOURCE))?;
        let body = CommunityConfig {
            entries: vec![Community::new(name, permission)],
        };
        let response = self.request(Method::POST, url).json(&body).send().await?;
        expect_status(&response, StatusCode::CREATED)
    }

    async fn delete(&self, name: &str) -> RotateKeyResult<()> {
        check_name(name)?;
        let url = self.community_resource(name)?;
        let response = self.request(Method::DELETE, url).send().await?;
        expect_status(&response, StatusCode::NO_CONTENT)
    }
}

#[async_trait]
impl ConfigBackend for RestconfBackend {
    fn transport(&self) -> TransportKind {
        TransportKind::Restconf
    }

    async fn validate(&mut self) -> bool {
        if self.state == RestconfState::Usable {
            return true;
        }
        self.state = RestconfState::Validating;
        match self.discover().await {
            Ok(root) => {
                debug!(target: self.base_url.as_str(), "RESTCONF root {}", root);
                self.root = Some(root);
                self.state = RestconfState::Usable;
                true
            }
            Err(err) => {
                warn!(target: self.base_url.as_str(), "RESTCONF unavailable: {}", err);
                self.state = RestconfState::Unusable;
                false
            }
        }
    }

    async fn list_communities(&mut self) -> RotateKeyResult<Vec<Community>> {
        if self.state != RestconfState::Usable {
            return Err(RotateKeyError::NotConnected);
        }
        self.fetch().await
    }

    async fn create_community(&mut self, name: &str, permission: Permission) -> OperationResult {
        if self.state != RestconfState::Usable {
            return OperationResult::failure(RotateKeyError::NotConnected.to_string());
        }
        self.create(name, permission).await.into()
    }

    async fn delete_community(&mut self, name: &str) -> OperationResult {
        if self.state != RestconfState::Usable {
            return OperationResult::failure(RotateKeyError::NotConnected.to_string());
        }
        self.delete(name).await.into()
    }

    async fn disconnect(&mut self) {
        if self.state == RestconfState::Usable {
            debug!(target: self.base_url.as_str(), "Releasing RESTCONF backend");
        }
        self.root = None;
        self.state = RestconfState::Unvalidated;
    }
}

fn yang_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(YANG_DATA_JSON));
    headers.insert(ACCEPT, HeaderValue::from_static(YANG_DATA_JSON));
    headers
}

fn expect_status(response: &Response, expected: StatusCode) -> RotateKeyResult<()> {
    if response.status() == expected {
        Ok(())
    } else {
        Err(unexpected(response))
    }
}

fn unexpected(response: &Response) -> RotateKeyError {
    RotateKeyError::UnexpectedStatus {
        status: response.status(),
        resource: response.url().path().to_string(),
    }
}
