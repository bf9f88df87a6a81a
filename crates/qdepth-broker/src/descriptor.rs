//! Broker connection URL parsing
//!
//! A [`ConnectionDescriptor`] is the parsed form of
//! `scheme://[user[:password]@]host[:port][/path]`. It records only what the URL
//! says; per-backend defaults are applied later by each backend's config.

use percent_encoding::percent_decode_str;
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{BrokerError, BrokerResult};

/// Parsed broker connection URL
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    scheme: String,
    host: Option<String>,
    port: Option<u16>,
    namespace: String,
    username: Option<String>,
    password: Option<String>,
}

impl ConnectionDescriptor {
    /// Parse a broker URL
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::InvalidUrl`] if the string is not a URL.
    pub fn parse(url: &str) -> BrokerResult<Self> {
        let parsed = Url::parse(url)?;

        let host = parsed
            .host_str()
            .filter(|host| !host.is_empty())
            .map(str::to_string);

        let username = Some(parsed.username())
            .filter(|user| !user.is_empty())
            .map(decode_component);
        let password = parsed.password().map(decode_component);

        let path = parsed.path();
        let namespace = path.strip_prefix('/').unwrap_or(path).to_string();

        Ok(Self {
            scheme: parsed.scheme().to_string(),
            host,
            port: parsed.port(),
            namespace,
            username,
            password,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Raw URL path with its leading slash removed; empty for the root namespace
    ///
    /// Percent escapes are left in place. Each backend decides how to read them.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
}

impl FromStr for ConnectionDescriptor {
    type Err = BrokerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// Credentials stay out of logs.
impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("namespace", &self.namespace)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

pub(crate) fn decode_component(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Decode a URL component, rejecting escapes that are not valid UTF-8
pub(crate) fn decode_component_strict(raw: &str) -> BrokerResult<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| BrokerError::InvalidUrl(format!("'{}' is not valid UTF-8: {}", raw, e)))
}
