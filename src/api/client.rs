use chrono::{DateTime, Utc};
use reqwest::{header, Client};
use std::time::Duration;

use super::time::format_instant;
use super::types::*;
use crate::config::Config;
use crate::report::PeriodRange;

/// Entries per request; anything past the first page is not fetched
pub const PAGE_SIZE: u32 = 1000;

const API_KEY_HEADER: &str = "X-Api-Key";

pub struct ClockifyClient {
    client: Client,
    base_url: String,
    api_key: String,
    workspace_id: String,
    user_id: String,
}

impl ClockifyClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let api_key = config
            .api_key()
            .map(str::to_string)
            .ok_or(ApiError::MissingApiKey)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base(),
            api_key,
            workspace_id: config.workspace_id().to_string(),
            user_id: config.user_id().to_string(),
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        log::debug!("GET {}", url);

        let response = self.client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            log::warn!("GET {} returned {}", endpoint, status);
            return Err(ApiError::Status { status, body });
        }

        serde_json::from_str(&body).map_err(|source| ApiError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    /// Time entries of the configured user that fall inside `range`
    pub async fn get_time_entries(&self, range: &PeriodRange) -> Result<Vec<RawTimeEntry>, ApiError> {
        let endpoint = time_entries_endpoint(&self.workspace_id, &self.user_id, range.start, range.end);
        let entries: Vec<RawTimeEntry> = self.get(&endpoint).await?;
        if entries.len() as u32 >= PAGE_SIZE {
            log::warn!(
                "{} returned a full page of {} entries; later pages are not loaded",
                range.period, PAGE_SIZE
            );
        }
        Ok(entries)
    }

    /// Every project in the workspace
    pub async fn get_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.get(&projects_endpoint(&self.workspace_id)).await
    }
}

pub fn time_entries_endpoint(workspace_id: &str, user_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!(
        "/workspaces/{}/user/{}/time-entries?start={}&end={}&page=1&page-size={}",
        urlencoding::encode(workspace_id),
        urlencoding::encode(user_id),
        urlencoding::encode(&format_instant(start)),
        urlencoding::encode(&format_instant(end)),
        PAGE_SIZE
    )
}

pub fn projects_endpoint(workspace_id: &str) -> String {
    // Clockify pages projects at 50 by default
    format!(
        "/workspaces/{}/projects?page=1&page-size={}",
        urlencoding::encode(workspace_id),
        PAGE_SIZE
    )
}
