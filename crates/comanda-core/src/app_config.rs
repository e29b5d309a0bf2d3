#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Process-wide configuration, read once at startup and passed explicitly
/// into the session lifecycle controller. There is no global singleton.
#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Base URL of the POS web application.
    pub pos_base_url: String,
    pub pos_username: String,
    pub pos_password: String,
    /// WebDriver endpoint (chromedriver) used to launch browser sessions.
    pub webdriver_url: String,
    /// Overall budget for a single navigation or extraction wait.
    pub operation_timeout_secs: u64,
    /// Sub-timeout granted to each individual locator strategy.
    pub locator_timeout_secs: u64,
    /// Attempts per click method before escalating to the next one.
    pub click_retries: u32,
    /// Pause between click attempts.
    pub click_pause_ms: u64,
    /// Sync target accepting JSON arrays of tables/products, if configured.
    pub sync_base_url: Option<String>,
    pub sync_timeout_secs: u64,
    /// Endpoint accepting confirmation screenshots, if configured.
    pub artifact_sink_url: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("pos_base_url", &self.pos_base_url)
            .field("pos_username", &self.pos_username)
            .field("pos_password", &"[redacted]")
            .field("webdriver_url", &self.webdriver_url)
            .field("operation_timeout_secs", &self.operation_timeout_secs)
            .field("locator_timeout_secs", &self.locator_timeout_secs)
            .field("click_retries", &self.click_retries)
            .field("click_pause_ms", &self.click_pause_ms)
            .field("sync_base_url", &self.sync_base_url)
            .field("sync_timeout_secs", &self.sync_timeout_secs)
            .field("artifact_sink_url", &self.artifact_sink_url)
            .finish()
    }
}
