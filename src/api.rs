/*
 * This file is part of Pulseboard.
 *
 * Copyright (C) 2025 Pulseboard contributors
 *
 * Pulseboard is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Pulseboard is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Pulseboard. If not, see <https://www.gnu.org/licenses/>.
 */

//! Wire types and the HTTP client for the metrics API.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "https://sundial-fe-interview.vercel.app";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDescriptor {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentValue {
    pub segment_id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentGroup {
    pub segment_key: String,
    pub display_name: String,
    #[serde(default)]
    pub values: Vec<SegmentValue>,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub value: f64,
}

/// The (metric, segmentKey, segmentId) triple a card is bound to. Serialized
/// as the body of a snapshot request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotQuery {
    pub metric: String,
    pub segment_key: String,
    pub segment_id: String,
}

/// Every endpoint wraps its payload in `{ "data": ... }`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub struct SnapshotData {
    #[serde(default)]
    pub values: Vec<SeriesPoint>,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            ApiError::Status {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

/// The remote collaborator. Implementations are called from worker threads.
#[cfg_attr(test, mockall::automock)]
pub trait MetricsApi: Send + Sync {
    fn fetch_metrics(&self) -> Result<Vec<MetricDescriptor>, ApiError>;
    fn fetch_segments(&self) -> Result<Vec<SegmentGroup>, ApiError>;
    fn fetch_snapshot(&self, query: &SnapshotQuery) -> Result<Vec<SeriesPoint>, ApiError>;
}

pub struct HttpApi {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("pulseboard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    fn decode<T: serde::de::DeserializeOwned>(
        resp: reqwest::blocking::Response,
    ) -> Result<T, ApiError> {
        let resp = resp.error_for_status()?;
        let body = resp.text()?;
        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        Ok(envelope.data)
    }
}

impl MetricsApi for HttpApi {
    fn fetch_metrics(&self) -> Result<Vec<MetricDescriptor>, ApiError> {
        let resp = self.client.get(self.endpoint("metrics")).send()?;
        Self::decode(resp)
    }

    fn fetch_segments(&self) -> Result<Vec<SegmentGroup>, ApiError> {
        let resp = self.client.get(self.endpoint("segments")).send()?;
        Self::decode(resp)
    }

    fn fetch_snapshot(&self, query: &SnapshotQuery) -> Result<Vec<SeriesPoint>, ApiError> {
        let resp = self
            .client
            .post(self.endpoint("snapshot"))
            .json(query)
            .send()?;
        let data: SnapshotData = Self::decode(resp)?;
        Ok(data.values)
    }
}
