// Onbid HTTP client
//
// One GET per call, no retries. Non-2xx responses are read in full and
// surfaced as IngestError::Upstream.

use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, error};

use super::config::OnbidApiConfig;
use super::{IngestError, Result};

/// Default `prptDvsnCd` for the interactive query
pub const DEFAULT_PROPERTY_TYPE: &str = "0001";

/// Filters for the interactive list query
///
/// Field names follow the web tier's query string.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default = "default_num_of_rows")]
    pub num_of_rows: u32,

    #[serde(default = "default_page_no")]
    pub page_no: u32,

    #[serde(default = "default_property_type")]
    pub prpt_dvsn_cd: String,

    pub sido: Option<String>,
    pub sgk: Option<String>,
    pub emd: Option<String>,
    pub cltr_mnmt_no: Option<String>,
    pub cltr_nm: Option<String>,
}

fn default_num_of_rows() -> u32 {
    10
}

fn default_page_no() -> u32 {
    1
}

fn default_property_type() -> String {
    DEFAULT_PROPERTY_TYPE.to_string()
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            num_of_rows: default_num_of_rows(),
            page_no: default_page_no(),
            prpt_dvsn_cd: default_property_type(),
            sido: None,
            sgk: None,
            emd: None,
            cltr_mnmt_no: None,
            cltr_nm: None,
        }
    }
}

impl ListQuery {
    /// Upstream parameters (upper-case names), empty filters omitted
    pub fn upstream_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("numOfRows", self.num_of_rows.to_string()),
            ("pageNo", self.page_no.to_string()),
            ("DPSL_MTD_CD", self.prpt_dvsn_cd.clone()),
        ];

        let filters = [
            ("SIDO", &self.sido),
            ("SGK", &self.sgk),
            ("EMD", &self.emd),
            ("CLTR_MNMT_NO", &self.cltr_mnmt_no),
            ("CLTR_NM", &self.cltr_nm),
        ];
        for (name, value) in filters {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                params.push((name, value.to_string()));
            }
        }

        params
    }
}

/// HTTP client for the Onbid list operation
#[derive(Clone)]
pub struct OnbidClient {
    client: Client,
    config: OnbidApiConfig,
}

impl OnbidClient {
    /// Create a client; fails on invalid configuration
    pub fn new(config: OnbidApiConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("onbid-ingest/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OnbidApiConfig {
        &self.config
    }

    /// Fetch one batch page (`numOfRows` from config, 1-based `pageNo`)
    pub async fn fetch_page(&self, page_no: u32) -> Result<String> {
        let params = [
            ("numOfRows", self.config.rows_per_page.to_string()),
            ("pageNo", page_no.to_string()),
        ];
        self.get_list(&params).await
    }

    /// Fetch one interactive list page
    pub async fn fetch_list(&self, query: &ListQuery) -> Result<String> {
        self.get_list(&query.upstream_params()).await
    }

    async fn get_list(&self, params: &[(&str, String)]) -> Result<String> {
        let url = self.config.list_url();
        debug!(url = %url, ?params, "Calling Onbid API");

        let response = self
            .client
            .get(&url)
            .query(&[("serviceKey", self.config.service_key.as_str())])
            .query(params)
            .send()
            .await?;

        read_body(response).await
    }
}

async fn read_body(response: Response) -> Result<String> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        error!(status = status.as_u16(), body = %body, "Onbid API returned an error status");
        return Err(IngestError::Upstream {
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}
