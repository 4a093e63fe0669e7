//! Session providers that turn org credentials into a bearer token.

use std::fmt;

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{AuthConfig, OrgConfig};

const SOAP_SESSION_ELEMENT: &[u8] = b"sessionId";

/// Opaque bearer credential for one org.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} rejected the credentials with status {status}: {body}")]
    Rejected {
        url: String,
        status: u16,
        body: String,
    },
    #[error("no session token in the response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },
}

pub trait SessionProvider {
    fn authenticate(&self, org: &OrgConfig) -> Result<Credential, AuthError>;
}

/// Authenticates with whichever grant the org is configured for.
#[derive(Debug, Clone)]
pub struct HttpSessionProvider {
    http: Client,
}

impl HttpSessionProvider {
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    fn soap_login(
        &self,
        org: &OrgConfig,
        username: &str,
        password: &str,
    ) -> Result<Credential, AuthError> {
        let url = format!("{}/services/Soap/u/{}", org.base_url(), org.api_version);
        debug!(url = %url, username = %username, "sending SOAP login");

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "text/xml; charset=UTF-8")
            .header("SOAPAction", "login")
            .body(soap_login_envelope(username, password))
            .send()
            .map_err(|source| AuthError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response.text().map_err(|source| AuthError::Transport {
            url: url.clone(),
            source,
        })?;
        if !status.is_success() {
            return Err(AuthError::Rejected {
                url,
                status: status.as_u16(),
                body,
            });
        }

        let session_id = parse_soap_session_id(&body)
            .map_err(|reason| AuthError::MalformedResponse { url, reason })?;
        info!(instance = %org.instance, username = %username, "authenticated with SOAP login");
        Ok(Credential::new(session_id))
    }

    fn client_credentials(
        &self,
        org: &OrgConfig,
        client_id: &str,
        client_secret: &str,
    ) -> Result<Credential, AuthError> {
        let url = format!("{}/services/oauth2/token", org.base_url());
        debug!(url = %url, "requesting client-credentials token");

        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .send()
            .map_err(|source| AuthError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response.text().map_err(|source| AuthError::Transport {
            url: url.clone(),
            source,
        })?;
        if !status.is_success() {
            return Err(AuthError::Rejected {
                url,
                status: status.as_u16(),
                body,
            });
        }

        let token = parse_access_token(&body)
            .map_err(|reason| AuthError::MalformedResponse { url, reason })?;
        info!(instance = %org.instance, "authenticated with client credentials");
        Ok(Credential::new(token))
    }
}

impl SessionProvider for HttpSessionProvider {
    fn authenticate(&self, org: &OrgConfig) -> Result<Credential, AuthError> {
        match &org.auth {
            AuthConfig::Password { username, password } => {
                self.soap_login(org, username, password.expose())
            }
            AuthConfig::ClientCredentials {
                client_id,
                client_secret,
            } => self.client_credentials(org, client_id, client_secret.expose()),
        }
    }
}

pub fn soap_login_envelope(username: &str, password: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8" ?>
<env:Envelope xmlns:xsd="http://www.w3.org/2001/XMLSchema"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
    xmlns:env="http://schemas.xmlsoap.org/soap/envelope/">
  <env:Body>
    <n1:login xmlns:n1="urn:partner.soap.sforce.com">
      <n1:username>{}</n1:username>
      <n1:password>{}</n1:password>
    </n1:login>
  </env:Body>
</env:Envelope>"#,
        escape(username),
        escape(password)
    )
}

/// Reads the text of the first `sessionId` element of a SOAP login response.
pub fn parse_soap_session_id(xml: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(xml);
    let mut in_session = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                in_session = element.local_name().as_ref() == SOAP_SESSION_ELEMENT;
            }
            Ok(Event::Text(text)) if in_session => {
                let value = text
                    .unescape()
                    .map_err(|err| format!("invalid sessionId text: {err}"))?;
                let value = value.trim();
                if value.is_empty() {
                    return Err("sessionId element is empty".to_string());
                }
                return Ok(value.to_string());
            }
            Ok(Event::End(_)) => in_session = false,
            Ok(Event::Eof) => return Err("sessionId element missing".to_string()),
            Err(err) => {
                return Err(format!(
                    "invalid XML at position {}: {err}",
                    reader.buffer_position()
                ));
            }
            Ok(_) => {}
        }
    }
}

pub fn parse_access_token(body: &str) -> Result<String, String> {
    let value: Value =
        serde_json::from_str(body).map_err(|err| format!("invalid token response: {err}"))?;
    value
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or_else(|| "access_token missing".to_string())
}
