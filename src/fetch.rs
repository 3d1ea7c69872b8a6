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

//! Background request execution. Each request runs on its own worker thread
//! and reports back over a channel that the UI loop drains.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::api::{ApiError, MetricsApi, SeriesPoint};
use crate::card::SnapshotRequest;
use crate::catalog::Catalog;
use crate::grid::CardId;

#[derive(Debug)]
pub enum FetchEvent {
    Catalog(Result<Catalog, ApiError>),
    Snapshot {
        card: CardId,
        generation: u64,
        result: Result<Vec<SeriesPoint>, ApiError>,
    },
}

pub struct Fetcher {
    api: Arc<dyn MetricsApi>,
    tx: Sender<FetchEvent>,
    rx: Receiver<FetchEvent>,
    in_flight: usize,
}

impl Fetcher {
    pub fn new(api: Arc<dyn MetricsApi>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { api, tx, rx, in_flight: 0 }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn spawn_catalog(&mut self) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        self.in_flight += 1;
        thread::spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| Catalog::load(api.as_ref())))
                .unwrap_or_else(|_| Err(worker_panicked("catalog")));
            let _ = tx.send(FetchEvent::Catalog(result));
        });
    }

    pub fn spawn_snapshot(&mut self, req: SnapshotRequest) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        self.in_flight += 1;
        thread::spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| api.fetch_snapshot(&req.query)))
                .unwrap_or_else(|_| Err(worker_panicked("snapshot")));
            let _ = tx.send(FetchEvent::Snapshot {
                card: req.card,
                generation: req.generation,
                result,
            });
        });
    }

    /// Next finished request, if any, without blocking.
    pub fn try_next(&mut self) -> Option<FetchEvent> {
        let ev = self.rx.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(ev)
    }

    /// Wait up to `timeout` for the next finished request.
    pub fn next_timeout(&mut self, timeout: Duration) -> Option<FetchEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(ev) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(ev)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

// Every spawned request must report back, or `in_flight` never drains.
fn worker_panicked(what: &str) -> ApiError {
    ApiError::Transport(format!("{} worker panicked", what))
}
