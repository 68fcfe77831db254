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

//! Per-property reservation calendar.
//!
//! Holds the stays of every pending or confirmed booking of one property,
//! keyed by check-in date. Reservations in a calendar never overlap, which
//! makes the conflict check a single ordered lookup.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use stayfinder::{BookingId, Calendar, Stay};
//!
//! let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
//! let mut calendar = Calendar::default();
//!
//! calendar.reserve(BookingId(1), Stay::new(day(10), day(15)).unwrap()).unwrap();
//! assert!(!calendar.is_free(&Stay::new(day(12), day(20)).unwrap()));
//! assert!(calendar.is_free(&Stay::new(day(15), day(20)).unwrap()));
//! ```

use crate::base::BookingId;
use crate::stay::Stay;
use crate::MarketplaceError;
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Reservation {
    booking_id: BookingId,
    stay: Stay,
}

#[derive(Debug, Default)]
pub struct Calendar {
    /// Active reservations indexed by check-in date.
    reservations: BTreeMap<NaiveDate, Reservation>,
}

impl Calendar {
    fn assert_invariants(&self) {
        debug_assert!(
            self.reservations
                .values()
                .zip(self.reservations.values().skip(1))
                .all(|(a, b)| a.stay.check_out() <= b.stay.check_in()),
            "Invariant violated: overlapping reservations in calendar"
        );
    }

    /// Returns the booking whose stay overlaps `stay`, if any.
    pub fn conflict(&self, stay: &Stay) -> Option<BookingId> {
        // Reservations are disjoint and sorted, so the last one starting
        // before the requested check-out has the latest check-out among all
        // candidates.
        self.reservations
            .range(..stay.check_out())
            .next_back()
            .map(|(_, reservation)| reservation)
            .filter(|reservation| reservation.stay.overlaps(stay))
            .map(|reservation| reservation.booking_id)
    }

    pub fn is_free(&self, stay: &Stay) -> bool {
        self.conflict(stay).is_none()
    }

    /// Blocks the dates of `stay` for `booking_id`.
    ///
    /// # Errors
    ///
    /// [`MarketplaceError::DatesUnavailable`] if any active reservation overlaps.
    pub fn reserve(&mut self, booking_id: BookingId, stay: Stay) -> Result<(), MarketplaceError> {
        if !self.is_free(&stay) {
            return Err(MarketplaceError::DatesUnavailable);
        }
        self.reservations
            .insert(stay.check_in(), Reservation { booking_id, stay });
        self.assert_invariants();
        Ok(())
    }

    /// Frees the dates held by `booking_id`. Returns whether anything was
    /// released.
    pub fn release(&mut self, booking_id: BookingId, stay: &Stay) -> bool {
        match self.reservations.get(&stay.check_in()) {
            Some(reservation) if reservation.booking_id == booking_id => {
                self.reservations.remove(&stay.check_in());
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }

    /// Active reservations in check-in order.
    pub fn reservations(&self) -> impl Iterator<Item = (BookingId, Stay)> + '_ {
        self.reservations
            .values()
            .map(|reservation| (reservation.booking_id, reservation.stay))
    }
}
