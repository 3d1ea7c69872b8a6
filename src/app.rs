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

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;
use serde_json::json;

use crate::api::MetricsApi;
use crate::card::{CardUpdate, FetchOutcome, MetricCard};
use crate::catalog::Catalog;
use crate::config::Config;
use crate::fetch::{FetchEvent, Fetcher};
use crate::grid::{self, CardGrid, CardHit, CardId, Side};
use crate::logger;
use crate::pointer::PointerRouter;

const VIEW_HELP: &str =
    "←↑↓→/Tab: focus | Enter: edit | [ / ]: add left/right | click: edit | q: quit";
const EDIT_HELP: &str = "Tab: metric/segment | ↑/↓: choose | Enter: save | Esc: cancel";
const LOADING_HELP: &str = "Loading catalogs... | r: retry | q: quit";

pub struct App {
    pub config: Config,
    pub catalog: Option<Catalog>,
    pub grid: Option<CardGrid>,
    pub cards: HashMap<CardId, MetricCard>,
    pub router: PointerRouter,
    pub focus: usize,
    pub scroll_row: usize,
    pub viewport: Rect,
    pub status: String,
    pub last_tick: Instant,
    catalog_pending: bool,
    fetcher: Fetcher,
}

impl App {
    /// Create the app and start loading the catalogs.
    pub fn new(config: Config, api: Arc<dyn MetricsApi>) -> Self {
        let mut app = Self {
            config,
            catalog: None,
            grid: None,
            cards: HashMap::new(),
            router: PointerRouter::new(),
            focus: 0,
            scroll_row: 0,
            viewport: Rect::new(0, 0, 120, 40),
            status: LOADING_HELP.to_string(),
            last_tick: Instant::now(),
            catalog_pending: false,
            fetcher: Fetcher::new(api),
        };
        app.load_catalog();
        app
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.config.tick_rate_ms)
    }

    pub fn is_ready(&self) -> bool {
        self.grid.is_some()
    }

    pub fn in_flight(&self) -> usize {
        self.fetcher.in_flight()
    }

    /// Request the catalogs unless they are loaded or already on the way.
    pub fn load_catalog(&mut self) -> bool {
        if self.is_ready() || self.catalog_pending {
            return false;
        }
        self.catalog_pending = true;
        self.fetcher.spawn_catalog();
        true
    }

    /// Apply every finished request without blocking.
    pub fn pump(&mut self) {
        while let Some(ev) = self.fetcher.try_next() {
            self.handle_fetch_event(ev);
        }
    }

    /// Apply finished requests until none are in flight or `timeout` passes.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.fetcher.in_flight() > 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            if let Some(ev) = self.fetcher.next_timeout(deadline - now) {
                self.handle_fetch_event(ev);
            }
        }
        true
    }

    pub fn handle_fetch_event(&mut self, ev: FetchEvent) {
        match ev {
            FetchEvent::Catalog(result) => {
                self.catalog_pending = false;
                match result {
                    Ok(catalog) => self.install_catalog(catalog),
                    Err(e) => {
                        logger::log_event("catalog_error", json!({ "error": e.to_string() }));
                    }
                }
            }
            FetchEvent::Snapshot { card, generation, result } => {
                let Some(widget) = self.cards.get_mut(&card) else {
                    return;
                };
                match widget.complete_fetch(generation, result) {
                    FetchOutcome::Applied => {}
                    FetchOutcome::Failed(error) => {
                        logger::log_event(
                            "snapshot_error",
                            json!({ "card": card.to_string(), "query": widget.committed(), "error": error }),
                        );
                    }
                    FetchOutcome::Stale => {
                        logger::log_event(
                            "snapshot_stale",
                            json!({ "card": card.to_string(), "generation": generation }),
                        );
                    }
                }
            }
        }
    }

    fn install_catalog(&mut self, catalog: Catalog) {
        if self.is_ready() {
            return;
        }
        let Some(grid) = CardGrid::new(&catalog) else {
            logger::log_event(
                "catalog_error",
                json!({
                    "error": "catalog has no metrics or segment values",
                    "metrics": catalog.metrics.len(),
                    "segments": catalog.segments.len(),
                }),
            );
            return;
        };
        logger::log_event(
            "catalog_loaded",
            json!({ "metrics": catalog.metrics.len(), "segments": catalog.segments.len() }),
        );
        self.catalog = Some(catalog);
        self.grid = Some(grid);
        self.focus = 0;
        self.status = VIEW_HELP.to_string();
        self.reconcile();
    }

    /// Bring card widgets in line with the grid: mount new ids, resync
    /// changed ones, drop ids that left the grid.
    fn reconcile(&mut self) {
        let Some(grid) = &self.grid else { return };
        let mut requests = Vec::new();
        for state in grid.cards() {
            match self.cards.get_mut(&state.id) {
                Some(widget) => requests.extend(widget.sync(state)),
                None => {
                    let (widget, req) = MetricCard::mount(state);
                    self.cards.insert(state.id, widget);
                    requests.push(req);
                }
            }
        }
        self.cards.retain(|id, _| grid.get(*id).is_some());
        for req in requests {
            self.fetcher.spawn_snapshot(req);
        }
    }

    pub fn card_count(&self) -> usize {
        self.grid.as_ref().map_or(0, CardGrid::len)
    }

    pub fn card_id_at(&self, index: usize) -> Option<CardId> {
        self.grid.as_ref()?.cards().get(index).map(|c| c.id)
    }

    pub fn focused_id(&self) -> Option<CardId> {
        self.card_id_at(self.focus)
    }

    pub fn editing_id(&self) -> Option<CardId> {
        self.router.listeners().into_iter().next()
    }

    pub fn add_card(&mut self, reference: CardId, side: Side) -> Option<CardId> {
        let (Some(grid), Some(catalog)) = (&mut self.grid, &self.catalog) else {
            return None;
        };
        let id = grid.add_card(catalog, reference, side)?;
        self.focus = grid.index_of(id).unwrap_or(self.focus);
        logger::log_event(
            "card_added",
            json!({ "id": id.to_string(), "reference": reference.to_string(), "side": format!("{:?}", side) }),
        );
        self.status = format!("Added card {} ({} total)", id, grid.len());
        self.reconcile();
        self.ensure_focus_visible();
        Some(id)
    }

    pub fn add_card_at_focus(&mut self, side: Side) -> Option<CardId> {
        let reference = self.focused_id()?;
        self.add_card(reference, side)
    }

    pub fn begin_edit(&mut self, id: CardId) -> bool {
        let Some(catalog) = &self.catalog else { return false };
        let Some(widget) = self.cards.get_mut(&id) else { return false };
        if !widget.begin_edit(catalog, &self.router) {
            return false;
        }
        if let Some(i) = self.grid.as_ref().and_then(|g| g.index_of(id)) {
            self.focus = i;
        }
        self.status = EDIT_HELP.to_string();
        true
    }

    pub fn edit_focused(&mut self) -> bool {
        match self.focused_id() {
            Some(id) => self.begin_edit(id),
            None => false,
        }
    }

    pub fn save_edit(&mut self, id: CardId) -> Option<CardUpdate> {
        let catalog = self.catalog.as_ref()?;
        let update = self.cards.get_mut(&id)?.save(catalog)?;
        self.apply_update(id, &update);
        self.status = VIEW_HELP.to_string();
        Some(update)
    }

    pub fn cancel_edit(&mut self, id: CardId) -> bool {
        let cancelled = self.cards.get_mut(&id).map_or(false, MetricCard::cancel);
        if cancelled {
            self.status = VIEW_HELP.to_string();
        }
        cancelled
    }

    /// Commit `update` to the grid and refetch if the triple changed.
    pub fn apply_update(&mut self, id: CardId, update: &CardUpdate) {
        let (Some(grid), Some(catalog)) = (&mut self.grid, &self.catalog) else {
            return;
        };
        if grid.update_card(catalog, id, &update.metric, &update.segment_key, &update.segment_id) {
            let label = grid.get(id).map(|c| c.display_name.clone()).unwrap_or_default();
            logger::log_event(
                "card_updated",
                json!({ "id": id.to_string(), "update": {
                    "metric": update.metric,
                    "segmentKey": update.segment_key,
                    "segmentId": update.segment_id,
                }, "displayName": label }),
            );
        }
        self.reconcile();
    }

    /// Forward an edit-mode key to the card being edited.
    pub fn edit_move(&mut self, delta: isize) {
        let (Some(id), Some(catalog)) = (self.editing_id(), &self.catalog) else { return };
        if let Some(widget) = self.cards.get_mut(&id) {
            widget.move_selection(catalog, delta);
        }
    }

    pub fn edit_toggle_field(&mut self) {
        let Some(id) = self.editing_id() else { return };
        if let Some(widget) = self.cards.get_mut(&id) {
            widget.toggle_field();
        }
    }

    pub fn columns(&self) -> usize {
        grid::effective_columns(
            self.card_count(),
            self.grid_area().width,
            self.config.min_card_width,
        )
    }

    pub fn move_focus(&mut self, dx: isize, dy: isize) {
        let count = self.card_count();
        if count == 0 {
            return;
        }
        let cols = self.columns() as isize;
        let target = self.focus as isize + dx + dy * cols;
        if (0..count as isize).contains(&target) {
            self.focus = target as usize;
        }
        self.ensure_focus_visible();
    }

    pub fn focus_next(&mut self) {
        let count = self.card_count();
        if count > 0 {
            self.focus = (self.focus + 1) % count;
            self.ensure_focus_visible();
        }
    }

    pub fn focus_prev(&mut self) {
        let count = self.card_count();
        if count > 0 {
            self.focus = (self.focus + count - 1) % count;
            self.ensure_focus_visible();
        }
    }

    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
        self.ensure_focus_visible();
    }

    pub fn grid_area(&self) -> Rect {
        crate::ui::grid_area(self.viewport)
    }

    fn ensure_focus_visible(&mut self) {
        let cols = self.columns().max(1);
        let row = self.focus / cols;
        let visible = grid::visible_rows(self.grid_area().height, self.config.card_height);
        if row < self.scroll_row {
            self.scroll_row = row;
        } else if row >= self.scroll_row + visible {
            self.scroll_row = row + 1 - visible;
        }
    }

    /// On-screen rectangle of every card, in grid order.
    pub fn card_rects(&self) -> Vec<(CardId, Option<Rect>)> {
        let Some(grid) = &self.grid else { return Vec::new() };
        let rects = grid::cell_rects(
            self.grid_area(),
            grid.len(),
            self.config.min_card_width,
            self.config.card_height,
            self.scroll_row,
        );
        grid.cards().iter().map(|c| c.id).zip(rects).collect()
    }

    /// Cancel every editing card whose body is not under the pointer. The
    /// `+` markers count as outside the card they border.
    pub fn dismiss_edits_outside(&mut self, column: u16, row: u16) {
        let rects = self.card_rects();
        let rect_of = |id: CardId| rects.iter().find(|(c, _)| *c == id).and_then(|(_, r)| *r);
        for id in self.router.listeners() {
            let on_body = rect_of(id)
                .map_or(false, |r| grid::hit_test(r, column, row) == Some(CardHit::Body));
            if !on_body {
                self.cancel_edit(id);
            }
        }
    }

    /// Primary-button pointer-down at a screen cell. Editing cards the
    /// pointer is not over are cancelled first, then the card under the
    /// pointer gets the click.
    pub fn pointer_down(&mut self, column: u16, row: u16) {
        self.dismiss_edits_outside(column, row);

        let rects = self.card_rects();
        let hit = rects.iter().find_map(|(id, rect)| {
            let rect = (*rect)?;
            grid::hit_test(rect, column, row).map(|h| (*id, h))
        });
        match hit {
            Some((id, CardHit::AddLeft)) => {
                self.add_card(id, Side::Left);
            }
            Some((id, CardHit::AddRight)) => {
                self.add_card(id, Side::Right);
            }
            Some((id, CardHit::Body)) => {
                if let Some(i) = self.grid.as_ref().and_then(|g| g.index_of(id)) {
                    self.focus = i;
                }
                let editing = self.cards.get(&id).map_or(false, MetricCard::is_editing);
                if !editing {
                    self.begin_edit(id);
                }
            }
            None => {}
        }
    }
}
