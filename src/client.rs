use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::OrgConfig;
use crate::document::{Document, NotAnObject, ResourceKind};
use crate::session::{AuthError, Credential, HttpSessionProvider, SessionProvider};

const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{method} {url} failed")]
    Transport {
        method: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} {url} returned status {status}: {body}")]
    Api {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },
    #[error("{method} {url} returned a body that is not valid JSON")]
    Decode {
        method: &'static str,
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot build a request url from {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("{method} {url} returned an unexpected payload")]
    UnexpectedPayload {
        method: &'static str,
        url: String,
        #[source]
        source: NotAnObject,
    },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Read and create access to the resources of one authenticated org.
pub trait ResourceClient {
    fn instance(&self) -> &str;

    fn fetch(&self, kind: ResourceKind, id: &str) -> Result<Document, ClientError>;

    fn create(&self, kind: ResourceKind, payload: &Value) -> Result<Document, ClientError>;

    /// Raw collection response for `kind`.
    fn list(&self, kind: ResourceKind) -> Result<Value, ClientError>;
}

/// Opens authenticated clients for orgs.
pub trait Connector {
    fn connect(&self, org: &OrgConfig) -> Result<Box<dyn ResourceClient>, AuthError>;
}

#[derive(Debug, Clone)]
pub struct HttpResourceClient {
    http: Client,
    instance: String,
    base_url: String,
    api_version: String,
    credential: Credential,
}

impl HttpResourceClient {
    pub fn new(http: Client, org: &OrgConfig, credential: Credential) -> Self {
        Self {
            http,
            instance: org.instance.clone(),
            base_url: org.base_url(),
            api_version: org.api_version.clone(),
            credential,
        }
    }

    pub fn collection_url(&self, kind: ResourceKind) -> String {
        format!(
            "{}/services/data/v{}/{}",
            self.base_url,
            self.api_version,
            kind.collection_path()
        )
    }

    /// Collection url plus `id` as one percent-encoded path segment.
    pub fn item_url(&self, kind: ResourceKind, id: &str) -> Result<Url, ClientError> {
        let collection = self.collection_url(kind);
        let invalid = |reason: String| ClientError::InvalidUrl {
            url: collection.clone(),
            reason,
        };

        let mut url = Url::parse(&collection).map_err(|err| invalid(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("base url cannot carry a path".to_string()))?
            .push(id);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(AUTHORIZATION, format!("Bearer {}", self.credential.token()))
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header(ACCEPT, JSON_CONTENT_TYPE)
    }

    fn send(
        &self,
        method: &'static str,
        url: &str,
        request: RequestBuilder,
    ) -> Result<Value, ClientError> {
        debug!(method, url, "sending request");
        let response = self
            .authorized(request)
            .send()
            .map_err(|source| ClientError::Transport {
                method,
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response.text().map_err(|source| ClientError::Transport {
            method,
            url: url.to_string(),
            source,
        })?;
        debug!(method, url, status = status.as_u16(), "received response");

        if !status.is_success() {
            return Err(ClientError::Api {
                method,
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| ClientError::Decode {
            method,
            url: url.to_string(),
            source,
        })
    }

    fn into_document(
        method: &'static str,
        url: &str,
        kind: ResourceKind,
        body: Value,
    ) -> Result<Document, ClientError> {
        Document::new(kind, body).map_err(|source| ClientError::UnexpectedPayload {
            method,
            url: url.to_string(),
            source,
        })
    }
}

impl ResourceClient for HttpResourceClient {
    fn instance(&self) -> &str {
        &self.instance
    }

    fn fetch(&self, kind: ResourceKind, id: &str) -> Result<Document, ClientError> {
        let url = self.item_url(kind, id)?;
        let body = self.send("GET", url.as_str(), self.http.get(url.clone()))?;
        Self::into_document("GET", url.as_str(), kind, body)
    }

    fn create(&self, kind: ResourceKind, payload: &Value) -> Result<Document, ClientError> {
        let url = self.collection_url(kind);
        let body = self.send("POST", &url, self.http.post(&url).json(payload))?;
        Self::into_document("POST", &url, kind, body)
    }

    fn list(&self, kind: ResourceKind) -> Result<Value, ClientError> {
        let url = self.collection_url(kind);
        self.send("GET", &url, self.http.get(&url))
    }
}

/// Authenticates with [`HttpSessionProvider`] and hands out
/// [`HttpResourceClient`]s sharing one connection pool.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    http: Client,
    sessions: HttpSessionProvider,
}

impl HttpConnector {
    pub fn new() -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(concat!("orgmigrate/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            sessions: HttpSessionProvider::new(http.clone()),
            http,
        })
    }
}

impl Connector for HttpConnector {
    fn connect(&self, org: &OrgConfig) -> Result<Box<dyn ResourceClient>, AuthError> {
        let credential = self.sessions.authenticate(org)?;
        Ok(Box::new(HttpResourceClient::new(
            self.http.clone(),
            org,
            credential,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, Secret};

    fn org(instance: &str) -> OrgConfig {
        OrgConfig {
            instance: instance.to_string(),
            api_version: "64.0".to_string(),
            data_space: "default".to_string(),
            auth: AuthConfig::Password {
                username: "admin@example.com".to_string(),
                password: Secret::new("pw"),
            },
        }
    }

    #[test]
    fn urls_follow_resource_collections() {
        let client = HttpResourceClient::new(
            Client::new(),
            &org("acme.my.salesforce.com"),
            Credential::new("token"),
        );

        assert_eq!(
            client.collection_url(ResourceKind::Dashboard),
            "https://acme.my.salesforce.com/services/data/v64.0/tableau/dashboards"
        );
        assert_eq!(
            client
                .item_url(ResourceKind::Visualization, "1AKHo000000GmaEOAS")
                .expect("item url")
                .as_str(),
            "https://acme.my.salesforce.com/services/data/v64.0/tableau/visualizations/1AKHo000000GmaEOAS"
        );
        assert_eq!(
            client
                .item_url(ResourceKind::SemanticModel, "Retail_NTO")
                .expect("item url")
                .as_str(),
            "https://acme.my.salesforce.com/services/data/v64.0/ssot/semantic/models/Retail_NTO"
        );
        assert_eq!(client.instance(), "acme.my.salesforce.com");
    }

    #[test]
    fn item_ids_are_a_single_encoded_segment() {
        let client = HttpResourceClient::new(
            Client::new(),
            &org("acme.my.salesforce.com"),
            Credential::new("token"),
        );

        let url = client
            .item_url(ResourceKind::Dashboard, "Sales/Q3?draft#1")
            .expect("item url");

        assert_eq!(
            url.as_str(),
            "https://acme.my.salesforce.com/services/data/v64.0/tableau/dashboards/Sales%2FQ3%3Fdraft%231"
        );
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
    }

    #[test]
    fn unparseable_instance_is_an_invalid_url() {
        let client = HttpResourceClient::new(
            Client::new(),
            &org("http://[not a host"),
            Credential::new("token"),
        );

        let err = client
            .item_url(ResourceKind::Dashboard, "Overview")
            .expect_err("bad base url");
        assert!(matches!(err, ClientError::InvalidUrl { .. }));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn api_errors_expose_status() {
        let err = ClientError::Api {
            method: "POST",
            url: "https://acme/services/data/v64.0/tableau/dashboards".to_string(),
            status: 400,
            body: r#"[{"errorCode":"INVALID_INPUT"}]"#.to_string(),
        };
        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("returned status 400"));
    }
}
