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

//! One metric card: its view/edit state machine and its fetch lifecycle.

use crate::api::{ApiError, SeriesPoint, SnapshotQuery};
use crate::catalog::Catalog;
use crate::grid::{CardId, CardState};
use crate::pointer::{OutsideClickSubscription, PointerRouter};

/// Points between "latest" and the comparison value (one week of daily data).
pub const DELTA_LOOKBACK: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    Loading,
    Loaded(Vec<SeriesPoint>),
    /// Rendered exactly like `Loading`; kept apart so the failure is inspectable.
    Failed(String),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EditField {
    Metric,
    Segment,
}

/// Edit-local selection. Indices point into the catalog's metric list and
/// its flattened segment values.
#[derive(Debug)]
pub struct EditSession {
    pub metric_idx: usize,
    pub segment_idx: usize,
    pub field: EditField,
    _outside_click: OutsideClickSubscription,
}

#[derive(Debug)]
pub enum CardMode {
    View,
    Edit(EditSession),
}

/// A committed edit, to be applied to the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct CardUpdate {
    pub metric: String,
    pub segment_key: String,
    pub segment_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRequest {
    pub card: CardId,
    pub generation: u64,
    pub query: SnapshotQuery,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Applied,
    Failed(String),
    /// A newer request superseded this one; the result was dropped.
    Stale,
}

pub struct MetricCard {
    id: CardId,
    committed: SnapshotQuery,
    mode: CardMode,
    fetch: FetchState,
    generation: u64,
}

impl MetricCard {
    /// Create the widget for a grid entry together with its first fetch.
    pub fn mount(state: &CardState) -> (Self, SnapshotRequest) {
        let mut card = Self {
            id: state.id,
            committed: state.query(),
            mode: CardMode::View,
            fetch: FetchState::Loading,
            generation: 0,
        };
        let req = card.begin_fetch();
        (card, req)
    }

    pub fn id(&self) -> CardId {
        self.id
    }

    pub fn committed(&self) -> &SnapshotQuery {
        &self.committed
    }

    pub fn mode(&self) -> &CardMode {
        &self.mode
    }

    pub fn fetch_state(&self) -> &FetchState {
        &self.fetch
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, CardMode::Edit(_))
    }

    /// True whenever the card shows its loading placeholder, including after
    /// a failed fetch.
    pub fn is_loading(&self) -> bool {
        !matches!(self.fetch, FetchState::Loaded(_))
    }

    pub fn series(&self) -> Option<&[SeriesPoint]> {
        match &self.fetch {
            FetchState::Loaded(points) => Some(points),
            _ => None,
        }
    }

    /// Pick up new grid state. Issues a fetch only if the committed triple
    /// actually changed.
    pub fn sync(&mut self, state: &CardState) -> Option<SnapshotRequest> {
        let query = state.query();
        if query == self.committed {
            return None;
        }
        self.committed = query;
        Some(self.begin_fetch())
    }

    fn begin_fetch(&mut self) -> SnapshotRequest {
        self.generation += 1;
        self.fetch = FetchState::Loading;
        SnapshotRequest {
            card: self.id,
            generation: self.generation,
            query: self.committed.clone(),
        }
    }

    pub fn complete_fetch(
        &mut self,
        generation: u64,
        result: Result<Vec<SeriesPoint>, ApiError>,
    ) -> FetchOutcome {
        if generation != self.generation {
            return FetchOutcome::Stale;
        }
        match result {
            Ok(points) => {
                self.fetch = FetchState::Loaded(points);
                FetchOutcome::Applied
            }
            Err(e) => {
                let msg = e.to_string();
                self.fetch = FetchState::Failed(msg.clone());
                FetchOutcome::Failed(msg)
            }
        }
    }

    /// View -> Edit. Returns false if already editing.
    pub fn begin_edit(&mut self, catalog: &Catalog, router: &PointerRouter) -> bool {
        if self.is_editing() {
            return false;
        }
        let session = EditSession {
            metric_idx: catalog.metric_index(&self.committed.metric).unwrap_or(0),
            segment_idx: catalog
                .flattened_segment_index(&self.committed.segment_id)
                .unwrap_or(0),
            field: EditField::Metric,
            _outside_click: router.subscribe(self.id),
        };
        self.mode = CardMode::Edit(session);
        true
    }

    pub fn toggle_field(&mut self) {
        if let CardMode::Edit(s) = &mut self.mode {
            s.field = match s.field {
                EditField::Metric => EditField::Segment,
                EditField::Segment => EditField::Metric,
            };
        }
    }

    /// Move the active selector by `delta`, clamped to the option list.
    pub fn move_selection(&mut self, catalog: &Catalog, delta: isize) {
        let CardMode::Edit(s) = &mut self.mode else { return };
        let (idx, len) = match s.field {
            EditField::Metric => (&mut s.metric_idx, catalog.metrics.len()),
            EditField::Segment => (&mut s.segment_idx, catalog.flattened_segments().len()),
        };
        if len == 0 {
            return;
        }
        let next = (*idx as isize + delta).clamp(0, len as isize - 1);
        *idx = next as usize;
    }

    /// Edit -> View, committing the local selection. The segment key is
    /// carried over from the committed state.
    pub fn save(&mut self, catalog: &Catalog) -> Option<CardUpdate> {
        let CardMode::Edit(s) = &self.mode else { return None };
        let metric = catalog
            .metrics
            .get(s.metric_idx)
            .map(|m| m.id.clone())
            .unwrap_or_else(|| self.committed.metric.clone());
        let segment_id = catalog
            .flattened_segments()
            .get(s.segment_idx)
            .map(|v| v.segment_id.clone())
            .unwrap_or_else(|| self.committed.segment_id.clone());
        let update = CardUpdate {
            metric,
            segment_key: self.committed.segment_key.clone(),
            segment_id,
        };
        self.mode = CardMode::View;
        Some(update)
    }

    /// Edit -> View, discarding the local selection.
    pub fn cancel(&mut self) -> bool {
        if !self.is_editing() {
            return false;
        }
        self.mode = CardMode::View;
        true
    }

    pub fn summary(&self) -> Option<Summary> {
        self.series().map(Summary::from_series)
    }
}

/// Numbers shown on a loaded card.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub latest: Option<f64>,
    pub delta: String,
}

impl Summary {
    pub fn from_series(series: &[SeriesPoint]) -> Self {
        Self {
            latest: series.last().map(|p| p.value),
            delta: percent_delta(series),
        }
    }

    /// Latest value as shown on the card, e.g. `12,345.6K`.
    pub fn latest_label(&self) -> String {
        match self.latest {
            Some(v) => format!("{}K", format_value(v)),
            None => "-".to_string(),
        }
    }

    pub fn delta_label(&self, signed_arrow: bool) -> String {
        format!("{} {}%", delta_arrow(&self.delta, signed_arrow), self.delta)
    }
}

/// Percent change from the value `DELTA_LOOKBACK` points back to the latest,
/// one decimal. `"0"` when there is no such value or it is zero.
pub fn percent_delta(series: &[SeriesPoint]) -> String {
    if series.len() < DELTA_LOOKBACK {
        return "0".to_string();
    }
    let latest = series[series.len() - 1].value;
    let base = series[series.len() - DELTA_LOOKBACK].value;
    if base == 0.0 {
        return "0".to_string();
    }
    let pct = (latest - base) / base * 100.0;
    let sign = if pct < 0.0 { "-" } else { "" };
    format!("{}{:.1}", sign, round_tenths(pct.abs()))
}

/// Round a non-negative value to one decimal, ties going up.
fn round_tenths(v: f64) -> f64 {
    (v * 10.0 + 0.5).floor() / 10.0
}

/// `↑` unless `signed` is set and the delta is negative.
pub fn delta_arrow(delta: &str, signed: bool) -> &'static str {
    if signed && delta.starts_with('-') {
        "↓"
    } else {
        "↑"
    }
}

/// Thousands separators, at most one fractional digit, trailing zero dropped.
pub fn format_value(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    let fixed = format!("{:.1}", round_tenths(v.abs()));
    let (digits, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "0"));
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 3);
    if v < 0.0 && fixed != "0.0" {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if frac != "0" {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}
