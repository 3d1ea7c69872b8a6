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

//! The ordered card collection and the layout rule that arranges it.

use std::fmt;

use ratatui::layout::Rect;

use crate::api::SnapshotQuery;
use crate::catalog::Catalog;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CardId(u64);

impl CardId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for CardId {
    fn from(raw: u64) -> Self {
        CardId(raw)
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardState {
    pub id: CardId,
    pub metric: String,
    pub segment_key: String,
    pub segment_id: String,
    pub display_name: String,
}

impl CardState {
    pub fn query(&self) -> SnapshotQuery {
        SnapshotQuery {
            metric: self.metric.clone(),
            segment_key: self.segment_key.clone(),
            segment_id: self.segment_id.clone(),
        }
    }
}

/// Cards in visual order: left-to-right, then top-to-bottom.
pub struct CardGrid {
    cards: Vec<CardState>,
    next_id: u64,
}

impl CardGrid {
    /// A grid holding one card seeded from the catalog defaults. Returns
    /// `None` when the catalog cannot seed a card.
    pub fn new(catalog: &Catalog) -> Option<Self> {
        let mut grid = Self { cards: Vec::new(), next_id: 1 };
        let card = grid.seed_card(catalog)?;
        grid.cards.push(card);
        Some(grid)
    }

    fn seed_card(&mut self, catalog: &Catalog) -> Option<CardState> {
        let sel = catalog.default_selection()?;
        let id = CardId(self.next_id);
        self.next_id += 1;
        Some(CardState {
            id,
            metric: sel.metric,
            segment_key: sel.segment_key,
            segment_id: sel.segment_id,
            display_name: sel.display_name,
        })
    }

    pub fn cards(&self) -> &[CardState] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, id: CardId) -> Option<&CardState> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn index_of(&self, id: CardId) -> Option<usize> {
        self.cards.iter().position(|c| c.id == id)
    }

    /// Insert a default card next to `reference`. An unknown reference puts
    /// the card at the front (left) or back (right). Returns the new id.
    pub fn add_card(&mut self, catalog: &Catalog, reference: CardId, side: Side) -> Option<CardId> {
        let card = self.seed_card(catalog)?;
        let id = card.id;
        let at = match (self.index_of(reference), side) {
            (Some(i), Side::Left) => i,
            (Some(i), Side::Right) => i + 1,
            (None, Side::Left) => 0,
            (None, Side::Right) => self.cards.len(),
        };
        self.cards.insert(at, card);
        Some(id)
    }

    /// Rebind card `id` in place. Never fails: catalog misses degrade the
    /// label, an unknown id changes nothing.
    pub fn update_card(
        &mut self,
        catalog: &Catalog,
        id: CardId,
        metric: &str,
        segment_key: &str,
        segment_id: &str,
    ) -> bool {
        let Some(card) = self.cards.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        card.metric = metric.to_string();
        card.segment_key = segment_key.to_string();
        card.segment_id = segment_id.to_string();
        card.display_name = catalog.display_name(metric, segment_key, segment_id);
        true
    }

    pub fn columns(&self) -> usize {
        column_count(self.cards.len())
    }
}

/// Columns for `count` cards: 1, 2, then 3 for anything larger.
pub fn column_count(count: usize) -> usize {
    match count {
        0 | 1 => 1,
        2 => 2,
        _ => 3,
    }
}

/// Column count after capping by the width available, never below 1.
pub fn effective_columns(count: usize, width: u16, min_card_width: u16) -> usize {
    let fit = (width / min_card_width.max(1)).max(1) as usize;
    column_count(count).min(fit)
}

pub fn row_count(count: usize, columns: usize) -> usize {
    count.div_ceil(columns.max(1))
}

/// Screen rectangles for each card, in grid order. Rows above `first_row`
/// or below the bottom of `area` get no rectangle.
pub fn cell_rects(
    area: Rect,
    count: usize,
    min_card_width: u16,
    card_height: u16,
    first_row: usize,
) -> Vec<Option<Rect>> {
    let cols = effective_columns(count, area.width, min_card_width);
    let col_width = area.width / cols as u16;
    (0..count)
        .map(|i| {
            let row = i / cols;
            let col = i % cols;
            if row < first_row {
                return None;
            }
            let y = area.y as usize + (row - first_row) * card_height as usize;
            if y + card_height as usize > (area.y + area.height) as usize {
                return None;
            }
            let x = area.x + col as u16 * col_width;
            // last column absorbs the rounding remainder
            let width = if col + 1 == cols { area.x + area.width - x } else { col_width };
            Some(Rect::new(x, y as u16, width, card_height))
        })
        .collect()
}

/// What a pointer-down on a card landed on. The add markers sit on the
/// middle row of the left and right borders.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CardHit {
    AddLeft,
    AddRight,
    Body,
}

pub fn contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x
        && column < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}

pub fn hit_test(rect: Rect, column: u16, row: u16) -> Option<CardHit> {
    if !contains(rect, column, row) {
        return None;
    }
    let mid = rect.y + rect.height / 2;
    if row == mid && column == rect.x {
        Some(CardHit::AddLeft)
    } else if row == mid && column + 1 == rect.x + rect.width {
        Some(CardHit::AddRight)
    } else {
        Some(CardHit::Body)
    }
}

/// How many full card rows fit in `height`.
pub fn visible_rows(height: u16, card_height: u16) -> usize {
    (height / card_height.max(1)).max(1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_utils::*;

    fn ids(grid: &CardGrid) -> Vec<u64> {
        grid.cards().iter().map(|c| c.id.value()).collect()
    }

    #[test]
    fn test_column_count_rule() {
        assert_eq!(column_count(1), 1);
        assert_eq!(column_count(2), 2);
        assert_eq!(column_count(3), 3);
        assert_eq!(column_count(4), 3);
        assert_eq!(column_count(10), 3);
    }

    #[test]
    fn test_effective_columns_capped_by_width() {
        assert_eq!(effective_columns(5, 120, 30), 3);
        assert_eq!(effective_columns(5, 70, 30), 2);
        assert_eq!(effective_columns(5, 10, 30), 1);
        assert_eq!(effective_columns(2, 200, 30), 2);
    }

    #[test]
    fn test_new_grid_has_one_default_card() {
        let catalog = create_mock_catalog();
        let grid = CardGrid::new(&catalog).unwrap();
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.columns(), 1);
        let card = &grid.cards()[0];
        assert_eq!(card.id.to_string(), "1");
        assert_eq!(card.display_name, "Active Users, United States");
    }

    #[test]
    fn test_new_grid_requires_seedable_catalog() {
        let mut catalog = create_mock_catalog();
        catalog.segments.clear();
        assert!(CardGrid::new(&catalog).is_none());
    }

    #[test]
    fn test_add_card_left_takes_reference_index() {
        let catalog = create_mock_catalog();
        let mut grid = CardGrid::new(&catalog).unwrap();
        let first = grid.cards()[0].id;
        let second = grid.add_card(&catalog, first, Side::Right).unwrap();
        let third = grid.add_card(&catalog, first, Side::Right).unwrap();
        assert_eq!(ids(&grid), vec![1, 3, 2]);

        let i = grid.index_of(third).unwrap();
        let new = grid.add_card(&catalog, third, Side::Left).unwrap();
        assert_eq!(grid.index_of(new), Some(i));
        assert_eq!(grid.len(), 4);
        assert_eq!(ids(&grid), vec![1, 4, 3, 2]);
        assert_eq!(grid.index_of(second), Some(3));
    }

    #[test]
    fn test_add_card_right_takes_next_index() {
        let catalog = create_mock_catalog();
        let mut grid = CardGrid::new(&catalog).unwrap();
        let first = grid.cards()[0].id;
        let new = grid.add_card(&catalog, first, Side::Right).unwrap();
        assert_eq!(grid.index_of(first), Some(0));
        assert_eq!(grid.index_of(new), Some(1));
        assert_eq!(grid.columns(), 2);
    }

    #[test]
    fn test_add_card_ids_never_repeat() {
        let catalog = create_mock_catalog();
        let mut grid = CardGrid::new(&catalog).unwrap();
        let first = grid.cards()[0].id;
        for _ in 0..50 {
            grid.add_card(&catalog, first, Side::Left);
        }
        let mut seen = ids(&grid);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 51);
    }

    #[test]
    fn test_add_card_unknown_reference() {
        let catalog = create_mock_catalog();
        let mut grid = CardGrid::new(&catalog).unwrap();
        let missing = CardId(999);
        let left = grid.add_card(&catalog, missing, Side::Left).unwrap();
        let right = grid.add_card(&catalog, missing, Side::Right).unwrap();
        assert_eq!(grid.index_of(left), Some(0));
        assert_eq!(grid.index_of(right), Some(2));
    }

    #[test]
    fn test_update_card_in_place() {
        let catalog = create_mock_catalog();
        let mut grid = CardGrid::new(&catalog).unwrap();
        let first = grid.cards()[0].id;
        let second = grid.add_card(&catalog, first, Side::Right).unwrap();
        let before = ids(&grid);

        assert!(grid.update_card(&catalog, second, "revenue", "region", "eu"));
        assert_eq!(ids(&grid), before);
        let card = grid.get(second).unwrap();
        assert_eq!(card.metric, "revenue");
        assert_eq!(card.segment_id, "eu");
        assert_eq!(card.display_name, "Revenue, Europe");
        assert_eq!(grid.get(first).unwrap().display_name, "Active Users, United States");
    }

    #[test]
    fn test_update_card_degrades_on_lookup_miss() {
        let catalog = create_mock_catalog();
        let mut grid = CardGrid::new(&catalog).unwrap();
        let first = grid.cards()[0].id;
        // "pro" belongs to the plan group, not region
        assert!(grid.update_card(&catalog, first, "revenue", "region", "pro"));
        assert_eq!(grid.get(first).unwrap().display_name, "Revenue, undefined");
        assert!(!grid.update_card(&catalog, CardId(42), "revenue", "region", "eu"));
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_cell_rects_wrap_rows() {
        let area = Rect::new(0, 1, 90, 30);
        let rects = cell_rects(area, 4, 30, 9, 0);
        assert_eq!(rects.len(), 4);
        assert_eq!(rects[0], Some(Rect::new(0, 1, 30, 9)));
        assert_eq!(rects[2], Some(Rect::new(60, 1, 30, 9)));
        assert_eq!(rects[3], Some(Rect::new(0, 10, 30, 9)));
    }

    #[test]
    fn test_cell_rects_clip_and_scroll() {
        let area = Rect::new(0, 0, 30, 18);
        let rects = cell_rects(area, 3, 30, 9, 0);
        assert!(rects[0].is_some() && rects[1].is_some());
        assert!(rects[2].is_none());

        let rects = cell_rects(area, 3, 30, 9, 1);
        assert!(rects[0].is_none());
        assert_eq!(rects[1], Some(Rect::new(0, 0, 30, 9)));
        assert_eq!(rects[2], Some(Rect::new(0, 9, 30, 9)));
        assert_eq!(visible_rows(18, 9), 2);
        assert_eq!(row_count(4, 3), 2);
    }

    #[test]
    fn test_hit_test_markers_and_body() {
        let rect = Rect::new(10, 2, 30, 9);
        assert_eq!(hit_test(rect, 10, 6), Some(CardHit::AddLeft));
        assert_eq!(hit_test(rect, 39, 6), Some(CardHit::AddRight));
        assert_eq!(hit_test(rect, 10, 5), Some(CardHit::Body));
        assert_eq!(hit_test(rect, 20, 6), Some(CardHit::Body));
        assert_eq!(hit_test(rect, 40, 6), None);
        assert_eq!(hit_test(rect, 20, 11), None);
        assert!(contains(rect, 39, 10));
    }
}
