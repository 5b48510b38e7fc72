//! Blocking HTTPS client for the iLO JSON endpoints.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use super::models::{FanSpeed, FansResponse, TemperatureResponse, TemperatureSensor};

const TEMPERATURE_ENDPOINT: &str = "json/health_temperature";
const FANS_ENDPOINT: &str = "json/health_fans";

/// Errors from the HTTPS side channel.
#[derive(Debug, Error)]
pub enum HttpsError {
    /// The HTTP request itself failed (network, DNS, TLS, decoding).
    #[error("HTTPS request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The iLO returned a non-2xx status code.
    #[error("iLO returned HTTP {status} for {endpoint}")]
    Status { status: u16, endpoint: String },

    /// The CA certificate could not be read.
    #[error("cannot read certificate {}: {source}", path.display())]
    Certificate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// TLS certificate verification mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsVerify {
    /// Accept any certificate; iLOs ship self-signed ones.
    Disabled,
    /// Verify against the system trust store.
    System,
    /// Verify against the system trust store plus this PEM certificate.
    Certificate(PathBuf),
}

/// Connection parameters for the iLO web interface.
#[derive(Clone)]
pub struct HttpsConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub verify: TlsVerify,
    /// Applied to connect and to the response separately.
    pub timeout: Duration,
}

impl std::fmt::Debug for HttpsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpsConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("verify", &self.verify)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Source of the side-channel data.
///
/// Implemented by [`HttpsClient`]; tests substitute canned data.
pub trait SideChannel: Send {
    /// Sensor details keyed by 1-based sensor id.
    fn temperature_sensors(&self) -> Result<BTreeMap<u32, TemperatureSensor>, HttpsError>;

    /// Fan speeds keyed by 1-based fan id.
    fn fan_speeds(&self) -> Result<BTreeMap<u32, FanSpeed>, HttpsError>;
}

/// HTTP client for one iLO.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct HttpsClient {
    client: reqwest::blocking::Client,
    host: String,
    username: String,
    password: String,
}

impl HttpsClient {
    /// Builds the client.
    ///
    /// Must not be called from inside an async runtime: the blocking
    /// client starts its own.
    pub fn new(config: &HttpsConfig) -> Result<Self, HttpsError> {
        let mut builder = reqwest::blocking::Client::builder()
            .connect_timeout(config.timeout)
            .timeout(config.timeout * 2);

        builder = match &config.verify {
            TlsVerify::Disabled => builder.danger_accept_invalid_certs(true),
            TlsVerify::System => builder,
            TlsVerify::Certificate(path) => {
                let pem = std::fs::read(path).map_err(|source| HttpsError::Certificate {
                    path: path.clone(),
                    source,
                })?;
                builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?)
            }
        };

        Ok(Self {
            client: builder.build()?,
            host: config.host.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Sends `GET https://<host>/<endpoint>` and deserializes the body.
    pub fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, HttpsError> {
        let url = format!("https://{}/{}", self.host, endpoint);
        debug!(%url, "fetching");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpsError::Status {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            });
        }

        Ok(response.json()?)
    }
}

impl SideChannel for HttpsClient {
    fn temperature_sensors(&self) -> Result<BTreeMap<u32, TemperatureSensor>, HttpsError> {
        let response: TemperatureResponse = self.get_json(TEMPERATURE_ENDPOINT)?;
        Ok(response.into_sensors())
    }

    fn fan_speeds(&self) -> Result<BTreeMap<u32, FanSpeed>, HttpsError> {
        let response: FansResponse = self.get_json(FANS_ENDPOINT)?;
        Ok(response.into_speeds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(verify: TlsVerify) -> HttpsConfig {
        HttpsConfig {
            host: "10.0.0.5".to_string(),
            username: "monitor".to_string(),
            password: "hunter2".to_string(),
            verify,
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", config(TlsVerify::Disabled));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("monitor"));
    }

    #[test]
    fn test_missing_certificate() {
        let err = HttpsClient::new(&config(TlsVerify::Certificate(PathBuf::from(
            "/nonexistent/ilo-ca.pem",
        ))))
        .err()
        .unwrap();
        assert!(matches!(err, HttpsError::Certificate { .. }));
        assert!(err.to_string().contains("/nonexistent/ilo-ca.pem"));
    }
}
