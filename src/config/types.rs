use serde::Deserialize;

/// Main configuration structure for Webpage Analyzer
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Background dispatcher and network bounds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Idle sleep between polls when no record is eligible (milliseconds)
    #[serde(rename = "poll-interval-ms")]
    pub poll_interval_ms: u64,

    /// Timeout for the main page fetch (seconds)
    #[serde(rename = "fetch-timeout-secs")]
    pub fetch_timeout_secs: u64,

    /// Timeout for a single outbound link probe (seconds)
    #[serde(rename = "probe-timeout-secs")]
    pub probe_timeout_secs: u64,

    /// Redirects a probe follows before treating the last response as final
    #[serde(rename = "max-probe-redirects")]
    pub max_probe_redirects: usize,

    /// Number of probes in flight for the links of one page
    #[serde(rename = "probe-concurrency")]
    pub probe_concurrency: usize,

    /// Re-queue records left `pending` by an interrupted process on startup
    #[serde(rename = "recover-pending")]
    pub recover_pending: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            fetch_timeout_secs: 30,
            probe_timeout_secs: 5,
            max_probe_redirects: 5,
            probe_concurrency: 1,
            recover_pending: true,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the analyzer client
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the analyzer client
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the analyzer
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for analyzer-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// User agent sent with page fetches: `Name/Version (+ContactURL; ContactEmail)`
    pub fn fetch_user_agent(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }

    /// Browser-like user agent sent with link probes, many sites reject bare bots
    pub fn probe_user_agent(&self) -> String {
        format!(
            "Mozilla/5.0 (compatible; {}/{}; +{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

/// Result store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,
}

/// HTTP façade configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(rename = "bind-address")]
    pub bind_address: String,

    /// Origins allowed by CORS
    #[serde(rename = "allowed-origins")]
    pub allowed_origins: Vec<String>,

    /// Page size used when a listing request omits `amount`
    #[serde(rename = "default-page-size")]
    pub default_page_size: u32,

    /// Largest page size a listing request may ask for
    #[serde(rename = "max-page-size")]
    pub max_page_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            allowed_origins: vec!["http://localhost:5173".to_string()],
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}
