//! RabbitMQ management API backend
//!
//! Queue depth comes from one `GET <api>/queues/<vhost>` per poll. The
//! listing covers every queue in the vhost and is filtered down to the
//! requested names, so queues the broker does not know are simply absent
//! from the result.

use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, error};
use url::Url;

use crate::{
    broker::{BrokerKind, QueueDepthSource, QueueStat},
    descriptor::{ConnectionDescriptor, decode_component, decode_component_strict},
    error::{BrokerError, BrokerResult},
    options::BrokerOptions,
};

pub const DEFAULT_HOST: &str = "localhost";
/// The URL port belongs to AMQP; the management plugin always listens here
pub const MANAGEMENT_PORT: u16 = 15672;
pub const DEFAULT_USERNAME: &str = "guest";
pub const DEFAULT_PASSWORD: &str = "guest";
pub const DEFAULT_VHOST: &str = "/";

/// Characters escaped when a vhost is placed in one path segment
const VHOST_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

/// Resolved management API settings with defaults applied
#[derive(Clone, PartialEq, Eq)]
pub struct ManagementApiConfig {
    pub host: String,
    pub port: u16,
    pub vhost: String,
    pub username: String,
    pub password: String,
    /// Base API URL; `queues/<vhost>` is resolved against it
    pub endpoint: Url,
    pub tolerate_error_status: bool,
}

impl ManagementApiConfig {
    /// Apply management API defaults to a parsed connection URL
    pub fn resolve(descriptor: &ConnectionDescriptor, options: &BrokerOptions) -> BrokerResult<Self> {
        let host = descriptor.host().unwrap_or(DEFAULT_HOST).to_string();
        let username = descriptor.username().unwrap_or(DEFAULT_USERNAME).to_string();
        let password = descriptor
            .password()
            .filter(|password| !password.is_empty())
            .unwrap_or(DEFAULT_PASSWORD)
            .to_string();
        let vhost = match descriptor.namespace() {
            "" => DEFAULT_VHOST.to_string(),
            vhost => decode_component_strict(vhost)?,
        };

        let endpoint = match &options.management_api {
            Some(api) => Url::parse(api).map_err(|e| {
                BrokerError::InvalidOptions(format!("management_api '{}': {}", api, e))
            })?,
            None => default_endpoint(&host, &username, &password, &vhost)?,
        };

        Ok(Self {
            host,
            port: MANAGEMENT_PORT,
            vhost,
            username,
            password,
            endpoint,
            tolerate_error_status: options.tolerate_error_status,
        })
    }

    /// Vhost escaped for use as a single URL path segment
    pub fn encoded_vhost(&self) -> String {
        encode_vhost(&self.vhost)
    }

    /// URL polled for the queue listing, without credentials
    pub fn queues_url(&self) -> BrokerResult<Url> {
        let mut url = self
            .endpoint
            .join(&format!("queues/{}", self.encoded_vhost()))?;
        strip_credentials(&mut url)?;
        Ok(url)
    }

    /// Basic-auth credentials for the request
    ///
    /// Credentials embedded in the endpoint win over the broker URL's.
    pub fn credentials(&self) -> (String, String) {
        let username = Some(self.endpoint.username())
            .filter(|user| !user.is_empty())
            .map(decode_component)
            .unwrap_or_else(|| self.username.clone());
        let password = self
            .endpoint
            .password()
            .map(decode_component)
            .filter(|password| !password.is_empty())
            .unwrap_or_else(|| self.password.clone());
        (username, password)
    }
}

impl fmt::Debug for ManagementApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut endpoint = self.endpoint.clone();
        if endpoint.password().is_some() {
            let _ = endpoint.set_password(Some("***"));
        }
        f.debug_struct("ManagementApiConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("vhost", &self.vhost)
            .field("username", &self.username)
            .field("endpoint", &endpoint.as_str())
            .field("tolerate_error_status", &self.tolerate_error_status)
            .finish()
    }
}

fn encode_vhost(vhost: &str) -> String {
    utf8_percent_encode(vhost, VHOST_SEGMENT).to_string()
}

fn default_endpoint(host: &str, username: &str, password: &str, vhost: &str) -> BrokerResult<Url> {
    let mut url = Url::parse(&format!(
        "http://{}:{}/api/{}",
        host,
        MANAGEMENT_PORT,
        encode_vhost(vhost)
    ))?;
    url.set_username(username)
        .and_then(|_| url.set_password(Some(password)))
        .map_err(|_| BrokerError::InvalidUrl(format!("cannot set credentials on {}", host)))?;
    Ok(url)
}

fn strip_credentials(url: &mut Url) -> BrokerResult<()> {
    if url.username().is_empty() && url.password().is_none() {
        return Ok(());
    }
    url.set_username("")
        .and_then(|_| url.set_password(None))
        .map_err(|_| BrokerError::InvalidUrl(format!("cannot strip credentials from {}", url)))
}

/// One entry of the management API queue listing
#[derive(Debug, Deserialize)]
struct QueueListing {
    name: String,
    /// Absent until the broker has collected stats for a new queue
    #[serde(default)]
    messages: Option<u64>,
}

/// RabbitMQ broker client
#[derive(Debug)]
pub struct ManagementApiBroker {
    config: ManagementApiConfig,
    client: Client,
    queues_url: Url,
    username: String,
    password: String,
}

impl ManagementApiBroker {
    /// Create a management API client; no request is made until the first poll
    pub fn new(descriptor: &ConnectionDescriptor, options: &BrokerOptions) -> BrokerResult<Self> {
        let config = ManagementApiConfig::resolve(descriptor, options)?;
        Self::with_config(config)
    }

    pub fn with_config(config: ManagementApiConfig) -> BrokerResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("qdepth/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let queues_url = config.queues_url()?;
        let (username, password) = config.credentials();

        debug!(url = %queues_url, vhost = %config.vhost, "Configured management API broker");

        Ok(Self {
            config,
            client,
            queues_url,
            username,
            password,
        })
    }

    pub fn config(&self) -> &ManagementApiConfig {
        &self.config
    }

    pub fn queues_url(&self) -> &Url {
        &self.queues_url
    }

    async fn fetch_listing(&self) -> BrokerResult<Vec<QueueListing>> {
        let response = self
            .client
            .get(self.queues_url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!(
                status = %status,
                url = %self.queues_url,
                "RabbitMQ management API call failed"
            );
            if !self.config.tolerate_error_status {
                return Err(BrokerError::transport(
                    BrokerKind::ManagementApi,
                    format!("management API returned {}", status),
                ));
            }
        }

        let body = response.bytes().await?;
        let listing = serde_json::from_slice(&body)?;
        Ok(listing)
    }
}

#[async_trait]
impl QueueDepthSource for ManagementApiBroker {
    async fn queues(&self, names: &[String]) -> BrokerResult<Vec<QueueStat>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let listing = self.fetch_listing().await?;
        let wanted: HashSet<&str> = names.iter().map(String::as_str).collect();
        let listed = listing.len();

        let stats: Vec<QueueStat> = listing
            .into_iter()
            .filter(|queue| wanted.contains(queue.name.as_str()))
            .map(|queue| QueueStat::new(queue.name, queue.messages.unwrap_or(0)))
            .collect();

        debug!(
            listed,
            requested = names.len(),
            matched = stats.len(),
            "Polled management API broker"
        );
        Ok(stats)
    }

    fn kind(&self) -> BrokerKind {
        BrokerKind::ManagementApi
    }
}
