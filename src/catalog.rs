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

use std::thread;

use serde::Serialize;

use crate::api::{ApiError, MetricDescriptor, MetricsApi, SegmentGroup, SegmentValue};

/// Session-lifetime lists of available metrics and segments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    pub metrics: Vec<MetricDescriptor>,
    pub segments: Vec<SegmentGroup>,
}

/// The selection a freshly created card starts with.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultSelection {
    pub metric: String,
    pub segment_key: String,
    pub segment_id: String,
    pub display_name: String,
}

impl Catalog {
    pub fn new(metrics: Vec<MetricDescriptor>, segments: Vec<SegmentGroup>) -> Self {
        Self { metrics, segments }
    }

    /// Fetch both catalogs concurrently and wait for both.
    pub fn load(api: &dyn MetricsApi) -> Result<Self, ApiError> {
        let (metrics, segments) = thread::scope(|s| {
            let segments = s.spawn(|| api.fetch_segments());
            let metrics = api.fetch_metrics();
            let segments = segments
                .join()
                .unwrap_or_else(|_| Err(ApiError::Transport("segments worker panicked".to_string())));
            (metrics, segments)
        });
        Ok(Self::new(metrics?, segments?))
    }

    /// A catalog is usable once it has a metric and a first segment group
    /// with at least one value to seed new cards from.
    pub fn is_ready(&self) -> bool {
        self.default_selection().is_some()
    }

    pub fn default_selection(&self) -> Option<DefaultSelection> {
        let metric = self.metrics.first()?;
        let group = self.segments.first()?;
        let value = group.values.first()?;
        Some(DefaultSelection {
            metric: metric.id.clone(),
            segment_key: group.segment_key.clone(),
            segment_id: value.segment_id.clone(),
            display_name: format!("{}, {}", metric.display_name, value.display_name),
        })
    }

    pub fn metric(&self, id: &str) -> Option<&MetricDescriptor> {
        self.metrics.iter().find(|m| m.id == id)
    }

    pub fn segment_value(&self, segment_key: &str, segment_id: &str) -> Option<&SegmentValue> {
        self.segments
            .iter()
            .find(|g| g.segment_key == segment_key)?
            .values
            .iter()
            .find(|v| v.segment_id == segment_id)
    }

    /// Label for a (metric, segment) pair. Lookup misses render as
    /// `undefined` rather than failing.
    pub fn display_name(&self, metric: &str, segment_key: &str, segment_id: &str) -> String {
        let metric_name = self.metric(metric).map(|m| m.display_name.as_str());
        let segment_name = self
            .segment_value(segment_key, segment_id)
            .map(|v| v.display_name.as_str());
        format!(
            "{}, {}",
            metric_name.unwrap_or("undefined"),
            segment_name.unwrap_or("undefined")
        )
    }

    /// All segment values of all groups, in group order.
    pub fn flattened_segments(&self) -> Vec<&SegmentValue> {
        self.segments.iter().flat_map(|g| g.values.iter()).collect()
    }

    pub fn metric_index(&self, id: &str) -> Option<usize> {
        self.metrics.iter().position(|m| m.id == id)
    }

    pub fn flattened_segment_index(&self, segment_id: &str) -> Option<usize> {
        self.flattened_segments()
            .iter()
            .position(|v| v.segment_id == segment_id)
    }
}
