use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{ProcessingError, Result};
use crate::power::PowerSeries;
use crate::utils::constants::{
    POWER_COMMUNITY,
};

/// Daily point request: location, inclusive date range and parameter names
#[derive(Debug, Clone, PartialEq)]
pub struct PowerQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub parameters: Vec<String>,
}

impl PowerQuery {
    /// Dates are `YYYYMMDD`, parameters comma separated
    pub fn new(
        latitude: f64,
        longitude: f64,
        start: &str,
        end: &str,
        parameters: &str,
    ) -> Result<Self> {
        let query = Self {
            latitude,
            longitude,
            start: NaiveDate::parse_from_str(start, "%Y%m%d")?,
            end: NaiveDate::parse_from_str(end, "%Y%m%d")?,
            parameters: parameters
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect(),
        };
        query.validate()?;
        Ok(query)
    }

    fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ProcessingError::Config(format!(
                "Latitude {} is outside -90..90",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ProcessingError::Config(format!(
                "Longitude {} is outside -180..180",
                self.longitude
            )));
        }
        if self.end < self.start {
            return Err(ProcessingError::Config(format!(
                "End date {} is before start date {}",
                self.end, self.start
            )));
        }
        if self.parameters.is_empty() {
            return Err(ProcessingError::Config(
                "At least one POWER parameter is required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("community", POWER_COMMUNITY.to_string()),
            ("longitude", self.longitude.to_string()),
            ("latitude", self.latitude.to_string()),
            ("start", self.start.format("%Y%m%d").to_string()),
            ("end", self.end.format("%Y%m%d").to_string()),
            ("parameters", self.parameters.join(",")),
            ("format", "JSON".to_string()),
        ]
    }
}

pub struct PowerClient {
    client: Client,
    base_url: String,
}

impl PowerClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Single GET; any non-success status is an error, no retries
    pub async fn fetch(&self, query: &PowerQuery) -> Result<PowerSeries> {
        info!(
            latitude = query.latitude,
            longitude = query.longitude,
            start = %query.start,
            end = %query.end,
            "requesting POWER daily point data"
        );

        let response = self
            .client
            .get(&self.base_url)
            .query(&query.query_pairs())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProcessingError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body: Value = serde_json::from_str(&response.text().await?)?;
        let series = PowerSeries::from_json(&body, &query.parameters)?;
        debug!(days = series.len(), "parsed POWER response");
        Ok(series)
    }
}
