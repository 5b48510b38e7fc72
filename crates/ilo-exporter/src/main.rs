//! ilo-exporter - Prometheus exporter for HP/HPE servers.
//!
//! Reads hardware health from the iLO management controller over SNMP (and
//! optionally its web interface over HTTPS) on every scrape of `/metrics`.

mod handlers;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use ilo_exporter_core::collector::{BulkCollector, PowerCollector, SnmpConfig, SnmpTransport};
use ilo_exporter_core::exporter::Exporter;
use ilo_exporter_core::https::{
    FanSpeedCollector, HttpsClient, HttpsConfig, TemperatureScan, TlsVerify,
};
use ilo_exporter_core::targets::{self, ScanPolicies};

// ============================================================
// CLI
// ============================================================

/// A fast(er) prometheus exporter for applicable HP servers using SNMP via
/// the ILO controller.
#[derive(Parser)]
#[command(name = "ilo-exporter", version = ilo_exporter_core::VERSION)]
struct Args {
    /// ILO IP address to scan.
    #[arg(short = 'i', long)]
    ilo_address: String,

    /// Address to bind for hosting the metrics endpoint.
    #[arg(short = 'a', long, default_value = "0.0.0.0")]
    server_address: String,

    /// Port to bind for the metrics endpoint.
    #[arg(short = 'p', long, default_value_t = 6969)]
    server_port: u16,

    /// SNMP community to read.
    #[arg(short = 'c', long, default_value = "public")]
    snmp_community: String,

    /// SNMP port to use.
    #[arg(long, default_value_t = 161)]
    snmp_port: u16,

    /// SNMP request timeout in seconds.
    #[arg(long, default_value_t = 5)]
    snmp_timeout: u64,

    /// Only scan for SNMP variables on init, instead of on each collection
    /// (except hard drives, see --scan-drives-once).
    #[arg(short = 'o', long)]
    scan_once: bool,

    /// When combined with --scan-once, this also prevents hard drives from
    /// being rescanned on collection. Not recommended.
    #[arg(long)]
    scan_drives_once: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,

    /// Fetch and combine additional temperature sensor info over https, such
    /// as sensor names. Requires ILO_USERNAME and ILO_PASSWORD.
    #[arg(long)]
    https_temperature: bool,

    /// Fetch the fan speed of each fan in percent over https. Requires
    /// ILO_USERNAME and ILO_PASSWORD.
    #[arg(long)]
    https_fans: bool,

    /// Verify the ILO certificate for https requests, against the system
    /// trust store or the certificate in ILO_CERTIFICATE.
    #[arg(long)]
    https_verify: bool,

    /// Timeout for https requests in seconds. Applies to connect and to the
    /// response separately, so a request may take up to twice as long.
    #[arg(long, default_value_t = 5)]
    https_timeout: u64,

    /// ILO web interface username.
    #[arg(long, env = "ILO_USERNAME", hide_env_values = true)]
    ilo_username: Option<String>,

    /// ILO web interface password.
    #[arg(long, env = "ILO_PASSWORD", hide_env_values = true)]
    ilo_password: Option<String>,

    /// PEM certificate to trust for the ILO web interface.
    #[arg(long, env = "ILO_CERTIFICATE", value_name = "PATH")]
    ilo_certificate: Option<PathBuf>,
}

impl Args {
    fn uses_https(&self) -> bool {
        self.https_temperature || self.https_fans
    }

    fn listen_addr(&self) -> Result<SocketAddr, String> {
        let host = self.server_address.trim_start_matches('[').trim_end_matches(']');
        let addr = if host.contains(':') {
            format!("[{}]:{}", host, self.server_port)
        } else {
            format!("{}:{}", host, self.server_port)
        };
        addr.parse()
            .map_err(|e| format!("invalid server address '{}': {}", addr, e))
    }

    fn snmp_config(&self) -> SnmpConfig {
        SnmpConfig::new(&self.ilo_address, &self.snmp_community)
            .with_port(self.snmp_port)
            .with_timeout(Duration::from_secs(self.snmp_timeout))
    }

    /// Builds the HTTPS settings, or `None` when no HTTPS feature is on.
    fn https_config(&self) -> Result<Option<HttpsConfig>, String> {
        if !self.uses_https() {
            return Ok(None);
        }

        let (Some(username), Some(password)) = (&self.ilo_username, &self.ilo_password) else {
            return Err("fetching values over https requires setting the ILO_USERNAME and ILO_PASSWORD environment variables".to_string());
        };

        let verify = match (self.https_verify, &self.ilo_certificate) {
            (false, _) => TlsVerify::Disabled,
            (true, Some(path)) => TlsVerify::Certificate(path.clone()),
            (true, None) => TlsVerify::System,
        };

        Ok(Some(HttpsConfig {
            host: self.ilo_address.clone(),
            username: username.clone(),
            password: password.clone(),
            verify,
            timeout: Duration::from_secs(self.https_timeout),
        }))
    }
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("ilo_exporter={}", level).parse().unwrap())
        .add_directive(format!("ilo_exporter_core={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn connect(config: &SnmpConfig) -> Result<SnmpTransport, String> {
    config.connect().map_err(|e| e.to_string())
}

/// Creates every collector. Runs the initial scans, so this talks to the
/// iLO before the server starts listening.
fn build_exporter(args: &Args) -> Result<Exporter, String> {
    let https = args.https_config()?;
    if let Some(config) = &https
        && config.verify == TlsVerify::Disabled
    {
        warn!("not verifying SSL certificate for https requests to the ILO");
    }
    // The blocking client must be built outside the async runtime.
    let client = https
        .as_ref()
        .map(HttpsClient::new)
        .transpose()
        .map_err(|e| e.to_string())?;

    let mut exporter = Exporter::new().map_err(|e| e.to_string())?;
    let counters = exporter.counters().clone();
    let snmp = args.snmp_config();
    let policies = ScanPolicies::from_flags(args.scan_once, args.scan_drives_once);

    exporter.register(PowerCollector::new(
        connect(&snmp)?,
        counters.scrape_failures.clone(),
    ));

    let mut temperature = targets::temperature::definition();
    if args.https_temperature
        && let Some(client) = &client
    {
        temperature = TemperatureScan::new(client.clone(), counters.https_failures.clone())
            .install(temperature);
    }
    exporter.register(BulkCollector::new(
        connect(&snmp)?,
        temperature,
        policies.default,
        counters.scrape_failures.clone(),
    ));

    exporter.register(BulkCollector::new(
        connect(&snmp)?,
        targets::fan::definition(),
        policies.default,
        counters.scrape_failures.clone(),
    ));
    if args.https_fans
        && let Some(client) = &client
    {
        exporter.register(FanSpeedCollector::new(
            client.clone(),
            counters.https_failures.clone(),
        ));
    }

    exporter.register(BulkCollector::new(
        connect(&snmp)?,
        targets::cpu::definition(),
        policies.default,
        counters.scrape_failures.clone(),
    ));
    exporter.register(BulkCollector::new(
        connect(&snmp)?,
        targets::drive::definition(),
        policies.drives,
        counters.scrape_failures.clone(),
    ));
    exporter.register(BulkCollector::new(
        connect(&snmp)?,
        targets::memory::definition(),
        policies.default,
        counters.scrape_failures.clone(),
    ));

    Ok(exporter)
}

fn app(exporter: Arc<Exporter>) -> Router {
    Router::new()
        .route("/metrics", get(handlers::handle_metrics))
        .route("/health", get(handlers::handle_health))
        .with_state(exporter)
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    info!(
        version = ilo_exporter_core::VERSION,
        ilo = %args.ilo_address,
        "ilo-exporter starting"
    );

    let addr = match args.listen_addr() {
        Ok(addr) => addr,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let exporter = match build_exporter(&args) {
        Ok(exporter) => Arc::new(exporter),
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };
    info!(collectors = exporter.source_count(), "collectors ready");

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to build tokio runtime");
            process::exit(1);
        }
    };

    let result = runtime.block_on(serve(exporter.clone(), addr));

    // Collectors may own blocking HTTP clients; drop them outside the runtime.
    drop(runtime);
    drop(exporter);

    if let Err(e) = result {
        error!(%addr, error = %e, "server error");
        process::exit(1);
    }
    info!("shutdown complete");
}

async fn serve(exporter: Arc<Exporter>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("starting metrics server on http://{}", addr);

    axum::serve(listener, app(exporter))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("received shutdown signal");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use ilo_exporter_core::collector::{MockTransport, ScanPolicy};
    use tower::ServiceExt;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["ilo-exporter", "-i", "10.0.0.5"];
        argv.extend_from_slice(extra);
        let mut args = Args::try_parse_from(argv).unwrap();
        // Do not pick up credentials from the test environment.
        args.ilo_username = None;
        args.ilo_password = None;
        args.ilo_certificate = None;
        args
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.server_port, 6969);
        assert_eq!(args.snmp_community, "public");
        assert_eq!(args.snmp_port, 161);
        assert!(!args.scan_once);
        assert_eq!(args.listen_addr().unwrap(), "0.0.0.0:6969".parse().unwrap());
        assert_eq!(args.snmp_config().timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_short_flags() {
        let args = parse(&["-a", "127.0.0.1", "-p", "9116", "-c", "monitoring", "-o", "-vv"]);
        assert_eq!(args.listen_addr().unwrap(), "127.0.0.1:9116".parse().unwrap());
        assert_eq!(args.snmp_community, "monitoring");
        assert!(args.scan_once);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_ipv6_listen_addr() {
        let args = parse(&["-a", "::1"]);
        assert_eq!(args.listen_addr().unwrap(), "[::1]:6969".parse().unwrap());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Args::try_parse_from(["ilo-exporter", "-i", "x", "-q", "-v"]).is_err());
        assert!(Args::try_parse_from(["ilo-exporter"]).is_err());
    }

    #[test]
    fn test_https_requires_credentials() {
        assert!(parse(&[]).https_config().unwrap().is_none());

        let mut args = parse(&["--https-fans"]);
        assert!(args.https_config().is_err());

        args.ilo_username = Some("monitor".to_string());
        args.ilo_password = Some("secret".to_string());
        let config = args.https_config().unwrap().unwrap();
        assert_eq!(config.verify, TlsVerify::Disabled);
        assert_eq!(config.host, "10.0.0.5");
    }

    #[test]
    fn test_https_verify_modes() {
        let mut args = parse(&["--https-temperature", "--https-verify"]);
        args.ilo_username = Some("monitor".to_string());
        args.ilo_password = Some("secret".to_string());
        assert_eq!(args.https_config().unwrap().unwrap().verify, TlsVerify::System);

        args.ilo_certificate = Some(PathBuf::from("/etc/ilo/ca.pem"));
        assert_eq!(
            args.https_config().unwrap().unwrap().verify,
            TlsVerify::Certificate(PathBuf::from("/etc/ilo/ca.pem"))
        );
    }

    fn mock_exporter() -> Arc<Exporter> {
        let agent = MockTransport::typical_server();
        let mut exporter = Exporter::new().unwrap();
        let failures = exporter.counters().scrape_failures.clone();
        exporter.register(PowerCollector::new(agent.clone(), failures.clone()));
        exporter.register(BulkCollector::new(
            agent,
            targets::fan::definition(),
            ScanPolicy::EveryCycle,
            failures,
        ));
        Arc::new(exporter)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_metrics_endpoint() {
        let response = app(mock_exporter())
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[axum::http::header::CONTENT_TYPE],
            prometheus::TEXT_FORMAT
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("ilo_server_power_draw"));
        assert!(text.contains("ilo_fan_info{"));
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = app(mock_exporter())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
