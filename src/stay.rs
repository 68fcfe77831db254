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

//! Stay date ranges.
//!
//! A stay covers the nights `[check_in, check_out)`: the guest leaves on the
//! check-out day, so a stay ending on the 15th and one starting on the 15th
//! do not overlap.
//!
//! ```
//! use chrono::NaiveDate;
//! use stayfinder::Stay;
//!
//! let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
//! let booked = Stay::new(day(10), day(15)).unwrap();
//!
//! assert!(booked.overlaps(&Stay::new(day(12), day(20)).unwrap()));
//! assert!(!booked.overlaps(&Stay::new(day(15), day(20)).unwrap()));
//! assert_eq!(booked.nights(), 5);
//! ```

use crate::MarketplaceError;
use chrono::NaiveDate;
use serde::Serialize;

/// A validated, non-empty closed-open date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Stay {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl Stay {
    /// # Errors
    ///
    /// [`MarketplaceError::InvalidRange`] unless `check_out > check_in`.
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, MarketplaceError> {
        if check_out <= check_in {
            return Err(MarketplaceError::InvalidRange);
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    /// Number of nights; always at least 1.
    pub fn nights(&self) -> i64 {
        self.check_out.signed_duration_since(self.check_in).num_days()
    }

    /// `[a, b)` and `[c, d)` overlap iff `a < d && c < b`.
    pub fn overlaps(&self, other: &Stay) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }
}
