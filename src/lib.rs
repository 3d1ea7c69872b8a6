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

//! Pulseboard - terminal analytics dashboard
//!
//! Metric cards with sparklines, fed by a JSON API. Each card fetches its
//! own series and can be rebound to another metric/segment in place; new
//! cards are inserted left or right of an existing one.

pub mod api;
pub mod catalog;
pub mod card;
pub mod grid;
pub mod pointer;
pub mod fetch;
pub mod app;
pub mod config;
pub mod events;
pub mod ui;
pub mod logger;

#[cfg(test)]
pub mod test_utils;
