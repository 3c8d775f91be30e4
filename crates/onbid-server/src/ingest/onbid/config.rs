// Onbid API configuration
//
// Built once at startup (ONBID_* environment variables) and handed to the
// client and pipeline constructors.

use std::fmt;
use std::time::Duration;

use super::{IngestError, Result};

pub const DEFAULT_BASE_URL: &str = "http://openapi.onbid.co.kr/openapi/services";
pub const DEFAULT_LIST_ENDPOINT: &str = "/KamcoPblsalThingInquireSvc/getKamcoPbctCltrList";
pub const DEFAULT_ROWS_PER_PAGE: u32 = 10_000;
pub const DEFAULT_TOTAL_PAGES: u32 = 10;
pub const DEFAULT_PAGE_DELAY_MS: u64 = 1_000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the Onbid open-data API
#[derive(Clone)]
pub struct OnbidApiConfig {
    /// Service root, e.g. `http://openapi.onbid.co.kr/openapi/services`
    pub base_url: String,

    /// Path of the list operation, appended to `base_url`
    pub list_endpoint: String,

    /// data.go.kr service key
    pub service_key: String,

    /// `numOfRows` for batch pages
    pub rows_per_page: u32,

    /// Pages attempted per run; not derived from `totalCount`
    pub total_pages: u32,

    /// Pause after each page fetch
    pub page_delay_ms: u64,

    /// HTTP timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OnbidApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            list_endpoint: DEFAULT_LIST_ENDPOINT.to_string(),
            service_key: String::new(),
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
            total_pages: DEFAULT_TOTAL_PAGES,
            page_delay_ms: DEFAULT_PAGE_DELAY_MS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for OnbidApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnbidApiConfig")
            .field("base_url", &self.base_url)
            .field("list_endpoint", &self.list_endpoint)
            .field("service_key", &"<redacted>")
            .field("rows_per_page", &self.rows_per_page)
            .field("total_pages", &self.total_pages)
            .field("page_delay_ms", &self.page_delay_ms)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl OnbidApiConfig {
    pub fn builder() -> OnbidApiConfigBuilder {
        OnbidApiConfigBuilder::default()
    }

    /// Load from `ONBID_*` environment variables
    ///
    /// `ONBID_API_SERVICE_KEY` is required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            base_url: std::env::var("ONBID_API_BASE_URL").unwrap_or(defaults.base_url),
            list_endpoint: std::env::var("ONBID_API_LIST_ENDPOINT")
                .unwrap_or(defaults.list_endpoint),
            service_key: std::env::var("ONBID_API_SERVICE_KEY").unwrap_or_default(),
            rows_per_page: parse_env("ONBID_ROWS_PER_PAGE", defaults.rows_per_page)?,
            total_pages: parse_env("ONBID_TOTAL_PAGES", defaults.total_pages)?,
            page_delay_ms: parse_env("ONBID_PAGE_DELAY_MS", defaults.page_delay_ms)?,
            timeout_secs: parse_env("ONBID_TIMEOUT_SECS", defaults.timeout_secs)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(IngestError::Validation("ONBID_API_BASE_URL cannot be empty".to_string()));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(IngestError::Validation(format!(
                "ONBID_API_BASE_URL must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }

        if self.list_endpoint.trim().is_empty() {
            return Err(IngestError::Validation(
                "ONBID_API_LIST_ENDPOINT cannot be empty".to_string(),
            ));
        }

        if self.service_key.trim().is_empty() {
            return Err(IngestError::Validation(
                "ONBID_API_SERVICE_KEY must be set".to_string(),
            ));
        }

        if self.rows_per_page == 0 {
            return Err(IngestError::Validation(
                "ONBID_ROWS_PER_PAGE must be greater than 0".to_string(),
            ));
        }

        if self.total_pages == 0 {
            return Err(IngestError::Validation(
                "ONBID_TOTAL_PAGES must be greater than 0".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(IngestError::Validation(
                "ONBID_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Full URL of the list operation
    pub fn list_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.list_endpoint.trim_start_matches('/')
        )
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            IngestError::Validation(format!("{} has an invalid value: '{}'", name, raw))
        }),
        Err(_) => Ok(default),
    }
}

/// Builder for OnbidApiConfig
#[derive(Debug, Default)]
pub struct OnbidApiConfigBuilder {
    base_url: Option<String>,
    list_endpoint: Option<String>,
    service_key: Option<String>,
    rows_per_page: Option<u32>,
    total_pages: Option<u32>,
    page_delay_ms: Option<u64>,
    timeout_secs: Option<u64>,
}

impl OnbidApiConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn list_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.list_endpoint = Some(endpoint.into());
        self
    }

    pub fn service_key(mut self, key: impl Into<String>) -> Self {
        self.service_key = Some(key.into());
        self
    }

    pub fn rows_per_page(mut self, rows: u32) -> Self {
        self.rows_per_page = Some(rows);
        self
    }

    pub fn total_pages(mut self, pages: u32) -> Self {
        self.total_pages = Some(pages);
        self
    }

    pub fn page_delay_ms(mut self, ms: u64) -> Self {
        self.page_delay_ms = Some(ms);
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn build(self) -> OnbidApiConfig {
        let defaults = OnbidApiConfig::default();
        OnbidApiConfig {
            base_url: self.base_url.unwrap_or(defaults.base_url),
            list_endpoint: self.list_endpoint.unwrap_or(defaults.list_endpoint),
            service_key: self.service_key.unwrap_or(defaults.service_key),
            rows_per_page: self.rows_per_page.unwrap_or(defaults.rows_per_page),
            total_pages: self.total_pages.unwrap_or(defaults.total_pages),
            page_delay_ms: self.page_delay_ms.unwrap_or(defaults.page_delay_ms),
            timeout_secs: self.timeout_secs.unwrap_or(defaults.timeout_secs),
        }
    }
}
