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

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::app::App;
use crate::grid::Side;

/// Main event handler that processes keyboard input. Returns true to quit.
pub fn handle_key_event(app: &mut App, key_event: KeyEvent) -> anyhow::Result<bool> {
    let KeyEvent { code, modifiers, kind, .. } = key_event;
    if kind == KeyEventKind::Release {
        return Ok(false);
    }

    if matches!((code, modifiers), (KeyCode::Char('c'), m) if m.contains(KeyModifiers::CONTROL)) {
        return Ok(true);
    }

    // Catalogs not loaded yet
    if !app.is_ready() {
        return handle_loading_events(app, code);
    }

    // An editing card takes all input
    if app.editing_id().is_some() {
        handle_edit_events(app, code);
        return Ok(false);
    }

    handle_grid_events(app, code)
}

fn handle_loading_events(app: &mut App, code: KeyCode) -> anyhow::Result<bool> {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
        KeyCode::Char('r') => {
            if app.load_catalog() {
                app.status = "Retrying catalog load...".to_string();
            }
        }
        _ => {}
    }
    Ok(false)
}

fn handle_edit_events(app: &mut App, code: KeyCode) {
    let Some(id) = app.editing_id() else { return };
    match code {
        KeyCode::Esc => {
            app.cancel_edit(id);
        }
        KeyCode::Enter => {
            app.save_edit(id);
        }
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Left | KeyCode::Right => app.edit_toggle_field(),
        KeyCode::Up => app.edit_move(-1),
        KeyCode::Down => app.edit_move(1),
        KeyCode::PageUp => app.edit_move(-5),
        KeyCode::PageDown => app.edit_move(5),
        _ => {}
    }
}

fn handle_grid_events(app: &mut App, code: KeyCode) -> anyhow::Result<bool> {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
        KeyCode::Enter | KeyCode::Char(' ') => {
            app.edit_focused();
        }
        KeyCode::Char('[') => {
            app.add_card_at_focus(Side::Left);
        }
        KeyCode::Char(']') => {
            app.add_card_at_focus(Side::Right);
        }
        KeyCode::Tab => app.focus_next(),
        KeyCode::BackTab => app.focus_prev(),
        KeyCode::Left | KeyCode::Char('h') => app.move_focus(-1, 0),
        KeyCode::Right | KeyCode::Char('l') => app.move_focus(1, 0),
        KeyCode::Up | KeyCode::Char('k') => app.move_focus(0, -1),
        KeyCode::Down | KeyCode::Char('j') => app.move_focus(0, 1),
        _ => {}
    }
    Ok(false)
}

/// Any button press dismisses edits elsewhere; only the left button
/// activates cards and markers.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    if !app.is_ready() {
        return;
    }
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => app.pointer_down(mouse.column, mouse.row),
        MouseEventKind::Down(_) => app.dismiss_edits_outside(mouse.column, mouse.row),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::test_utils::test_utils::*;
    use crossterm::event::KeyEventState;
    use std::sync::Arc;
    use std::time::Duration;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn ready_app() -> App {
        let mut app = App::new(Config::default(), Arc::new(mock_api_with_series(&[4.0, 5.0])));
        assert!(app.wait_idle(Duration::from_secs(5)));
        app
    }

    #[test]
    fn test_quit_keys() {
        let mut app = ready_app();
        assert!(handle_key_event(&mut app, key(KeyCode::Char('q'))).unwrap());
        assert!(handle_key_event(&mut app, key(KeyCode::Esc)).unwrap());
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(handle_key_event(&mut app, ctrl_c).unwrap());
    }

    #[test]
    fn test_bracket_keys_insert_around_focus() {
        let mut app = ready_app();
        let first = app.focused_id().unwrap();
        handle_key_event(&mut app, key(KeyCode::Char(']'))).unwrap();
        assert_eq!(app.card_count(), 2);
        assert_eq!(app.focus, 1);
        handle_key_event(&mut app, key(KeyCode::Char('['))).unwrap();
        assert_eq!(app.card_count(), 3);
        assert_eq!(app.focus, 1);
        assert_eq!(app.card_id_at(0), Some(first));
    }

    #[test]
    fn test_edit_keys_route_to_card() {
        let mut app = ready_app();
        let id = app.focused_id().unwrap();
        handle_key_event(&mut app, key(KeyCode::Enter)).unwrap();
        assert_eq!(app.editing_id(), Some(id));

        // Esc cancels instead of quitting while editing
        assert!(!handle_key_event(&mut app, key(KeyCode::Esc)).unwrap());
        assert_eq!(app.editing_id(), None);

        handle_key_event(&mut app, key(KeyCode::Enter)).unwrap();
        handle_key_event(&mut app, key(KeyCode::Tab)).unwrap();
        handle_key_event(&mut app, key(KeyCode::Down)).unwrap();
        // 'q' is ignored in edit mode
        assert!(!handle_key_event(&mut app, key(KeyCode::Char('q'))).unwrap());
        handle_key_event(&mut app, key(KeyCode::Enter)).unwrap();
        let card = app.grid.as_ref().unwrap().get(id).unwrap();
        assert_eq!(card.segment_id, "eu");
        assert_eq!(card.display_name, "Active Users, Europe");
    }

    #[test]
    fn test_loading_state_keys() {
        let mut api = crate::api::MockMetricsApi::new();
        api.expect_fetch_metrics()
            .returning(|| Err(crate::api::ApiError::Transport("down".to_string())));
        api.expect_fetch_segments().returning(|| Ok(create_mock_segments()));
        let mut app = App::new(Config::default(), Arc::new(api));
        assert!(app.wait_idle(Duration::from_secs(5)));

        assert!(!handle_key_event(&mut app, key(KeyCode::Char('r'))).unwrap());
        assert_eq!(app.status, "Retrying catalog load...");
        assert!(!handle_key_event(&mut app, key(KeyCode::Enter)).unwrap());
        assert!(handle_key_event(&mut app, key(KeyCode::Char('q'))).unwrap());
    }

    #[test]
    fn test_mouse_click_enters_edit() {
        let mut app = ready_app();
        let rect = app.card_rects()[0].1.unwrap();
        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: rect.x + 2,
            row: rect.y + 1,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse_event(&mut app, click);
        assert!(app.editing_id().is_some());

        let outside = MouseEvent { column: 0, row: 39, ..click };
        handle_mouse_event(&mut app, outside);
        assert!(app.editing_id().is_none());
    }

    #[test]
    fn test_other_buttons_only_dismiss() {
        let mut app = ready_app();
        let id = app.focused_id().unwrap();
        let rect = app.card_rects()[0].1.unwrap();
        let right_click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Right),
            column: rect.x + 2,
            row: rect.y + 1,
            modifiers: KeyModifiers::NONE,
        };
        // right click on a card body does not start editing
        handle_mouse_event(&mut app, right_click);
        assert!(app.editing_id().is_none());

        app.begin_edit(id);
        handle_mouse_event(&mut app, right_click);
        assert_eq!(app.editing_id(), Some(id));

        let middle_outside = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Middle),
            column: 0,
            row: 39,
            ..right_click
        };
        handle_mouse_event(&mut app, middle_outside);
        assert!(app.editing_id().is_none());
        assert_eq!(app.card_count(), 1);
    }
}
