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

mod ui_card;
mod ui_components;

use ratatui::layout::Rect;
use ratatui::Frame;

use crate::app::App;

/// The area between the header line and the status line.
pub fn grid_area(size: Rect) -> Rect {
    Rect {
        x: size.x,
        y: size.y.saturating_add(1),
        width: size.width,
        height: size.height.saturating_sub(2),
    }
}

pub fn ui(f: &mut Frame, app: &App) {
    let size = f.area();
    let header = Rect { height: size.height.min(1), ..size };
    let status = Rect {
        y: size.y + size.height.saturating_sub(1),
        height: size.height.min(1),
        ..size
    };

    ui_components::render_header(f, app, header);
    if app.is_ready() {
        render_grid(f, app);
    } else {
        ui_components::render_loading(f, grid_area(size));
    }
    ui_components::render_status_bar(f, app, status);
}

fn render_grid(f: &mut Frame, app: &App) {
    let (Some(grid), Some(catalog)) = (&app.grid, &app.catalog) else { return };
    for (idx, (id, rect)) in app.card_rects().into_iter().enumerate() {
        let (Some(rect), Some(state), Some(card)) = (rect, grid.get(id), app.cards.get(&id)) else {
            continue;
        };
        let view = ui_card::CardView {
            state,
            card,
            catalog,
            focused: idx == app.focus,
            signed_arrow: app.config.signed_delta_arrow,
        };
        ui_card::render_card(f, rect, &view);
    }
}
