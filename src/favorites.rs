// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Per-user favorite listings.

use crate::base::{FavoriteId, PropertyId, Sequence, UserId};
use crate::MarketplaceError;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Favorite {
    pub id: FavoriteId,
    pub user_id: UserId,
    pub property_id: PropertyId,
    pub created_at: DateTime<Utc>,
}

/// Favorites grouped by user. Each `(user, property)` pair appears at most
/// once; the per-user shard lock makes check-and-insert atomic.
#[derive(Debug, Default)]
pub struct FavoritesSet {
    favorites: DashMap<UserId, Vec<Favorite>>,
    ids: Sequence,
}

impl FavoritesSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// [`MarketplaceError::AlreadyFavorited`] if the pair already exists.
    pub fn add(&self, user: UserId, property_id: PropertyId) -> Result<Favorite, MarketplaceError> {
        let mut favorites = self.favorites.entry(user).or_default();
        if favorites.iter().any(|f| f.property_id == property_id) {
            return Err(MarketplaceError::AlreadyFavorited);
        }
        let favorite = Favorite {
            id: FavoriteId(self.ids.next()),
            user_id: user,
            property_id,
            created_at: Utc::now(),
        };
        favorites.push(favorite.clone());
        Ok(favorite)
    }

    /// # Errors
    ///
    /// [`MarketplaceError::FavoriteNotFound`] if the pair does not exist.
    pub fn remove(&self, user: UserId, property_id: PropertyId) -> Result<(), MarketplaceError> {
        let mut favorites = self
            .favorites
            .get_mut(&user)
            .ok_or(MarketplaceError::FavoriteNotFound)?;
        let index = favorites
            .iter()
            .position(|f| f.property_id == property_id)
            .ok_or(MarketplaceError::FavoriteNotFound)?;
        favorites.remove(index);
        Ok(())
    }

    /// Favorited property ids in the order they were added.
    pub fn property_ids(&self, user: UserId) -> Vec<PropertyId> {
        self.favorites
            .get(&user)
            .map(|favorites| favorites.iter().map(|f| f.property_id).collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, user: UserId, property_id: PropertyId) -> bool {
        self.favorites
            .get(&user)
            .is_some_and(|favorites| favorites.iter().any(|f| f.property_id == property_id))
    }
}
