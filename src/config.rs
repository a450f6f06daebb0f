use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub data: DataConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// CSV files or directories (every `*.csv` directly inside is read).
    pub sources: Vec<String>,
    /// Where `process-logs` writes the derived dataset.
    #[serde(default = "default_output_path")]
    pub output_path: String,
}

fn default_output_path() -> String {
    "processed_logs.csv".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Upper bound on points returned per series by /api/query.
    #[serde(default = "default_max_points")]
    pub max_points: usize,
    /// Seconds a loaded series is reused before the sources are re-read.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            max_points: default_max_points(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_max_points() -> usize {
    500
}

fn default_cache_ttl_secs() -> u64 {
    300
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.server.host.is_empty(),
            "server.host must be non-empty"
        );
        anyhow::ensure!(
            !self.data.sources.is_empty(),
            "data.sources must list at least one file or directory"
        );
        anyhow::ensure!(
            self.data.sources.iter().all(|s| !s.trim().is_empty()),
            "data.sources entries must be non-empty"
        );
        anyhow::ensure!(
            !self.data.output_path.is_empty(),
            "data.output_path must be non-empty"
        );
        anyhow::ensure!(
            self.dashboard.max_points >= 2,
            "dashboard.max_points must be >= 2, got {}",
            self.dashboard.max_points
        );
        anyhow::ensure!(
            self.dashboard.cache_ttl_secs > 0,
            "dashboard.cache_ttl_secs must be > 0, got {}",
            self.dashboard.cache_ttl_secs
        );
        Ok(())
    }
}
