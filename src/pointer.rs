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

//! Outside-click subscriptions.
//!
//! A card in edit mode holds an [`OutsideClickSubscription`]; while it is
//! alive the router reports the card as interested in pointer-down events.
//! Dropping the subscription (any exit from edit mode) unregisters it.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::grid::CardId;

#[derive(Default, Clone)]
pub struct PointerRouter {
    listeners: Rc<RefCell<BTreeSet<CardId>>>,
}

impl PointerRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, card: CardId) -> OutsideClickSubscription {
        self.listeners.borrow_mut().insert(card);
        OutsideClickSubscription {
            card,
            listeners: Rc::clone(&self.listeners),
        }
    }

    /// Cards currently listening for outside clicks.
    pub fn listeners(&self) -> Vec<CardId> {
        self.listeners.borrow().iter().copied().collect()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

#[derive(Debug)]
pub struct OutsideClickSubscription {
    card: CardId,
    listeners: Rc<RefCell<BTreeSet<CardId>>>,
}

impl OutsideClickSubscription {
    pub fn card(&self) -> CardId {
        self.card
    }
}

impl Drop for OutsideClickSubscription {
    fn drop(&mut self) {
        self.listeners.borrow_mut().remove(&self.card);
    }
}
