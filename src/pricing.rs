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

//! Stay price calculation.
//!
//! The first week is charged at the base nightly rate, every further night
//! at the weekly rate, and tax is added as a percentage of the subtotal.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use stayfinder::pricing::compute;
//!
//! assert_eq!(compute(dec!(1000), dec!(800), dec!(10), 5).unwrap(), dec!(5500));
//! assert_eq!(compute(dec!(1000), dec!(800), dec!(10), 10).unwrap(), dec!(10340));
//! ```

use crate::MarketplaceError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Nights charged at the base rate before the weekly rate applies.
pub const BASE_RATE_NIGHTS: i64 = 7;

/// Money amounts are kept to cents.
pub const MONEY_PRECISION: u32 = 2;

/// Upper bound for a nightly rate.
pub const MAX_NIGHTLY_RATE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Nightly rates and tax of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rates {
    /// Per-night price for the first week.
    pub base_rate: Decimal,
    /// Per-night price from the eighth night on.
    pub weekly_rate: Decimal,
    /// Tax as a percentage of the subtotal, e.g. `12` for 12%.
    pub tax_percent: Decimal,
}

impl Rates {
    pub fn new(base_rate: Decimal, weekly_rate: Decimal, tax_percent: Decimal) -> Self {
        Self {
            base_rate,
            weekly_rate,
            tax_percent,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), MarketplaceError> {
        if self.base_rate <= Decimal::ZERO {
            return Err(MarketplaceError::invalid("base rate must be positive"));
        }
        if self.weekly_rate <= Decimal::ZERO {
            return Err(MarketplaceError::invalid("weekly rate must be positive"));
        }
        if self.base_rate > MAX_NIGHTLY_RATE || self.weekly_rate > MAX_NIGHTLY_RATE {
            return Err(MarketplaceError::invalid(format!(
                "nightly rates must not exceed {MAX_NIGHTLY_RATE}"
            )));
        }
        if self.tax_percent < Decimal::ZERO || self.tax_percent > Decimal::ONE_HUNDRED {
            return Err(MarketplaceError::invalid("tax percent must be between 0 and 100"));
        }
        Ok(())
    }

    /// Full price breakdown for a stay of `nights` nights.
    ///
    /// # Errors
    ///
    /// - [`MarketplaceError::InvalidRange`] - `nights <= 0`.
    /// - [`MarketplaceError::InvalidInput`] - The price does not fit in a `Decimal`.
    pub fn quote(&self, nights: i64) -> Result<Quote, MarketplaceError> {
        if nights <= 0 {
            return Err(MarketplaceError::InvalidRange);
        }

        let subtotal = if nights <= BASE_RATE_NIGHTS {
            self.base_rate.checked_mul(Decimal::from(nights))
        } else {
            let week = self.base_rate.checked_mul(Decimal::from(BASE_RATE_NIGHTS));
            let rest = self
                .weekly_rate
                .checked_mul(Decimal::from(nights - BASE_RATE_NIGHTS));
            week.zip(rest).and_then(|(week, rest)| week.checked_add(rest))
        }
        .ok_or_else(price_overflow)?;
        let tax = subtotal
            .checked_mul(self.tax_percent)
            .and_then(|taxed| taxed.checked_div(Decimal::ONE_HUNDRED))
            .ok_or_else(price_overflow)?;
        let total = subtotal.checked_add(tax).ok_or_else(price_overflow)?;

        Ok(Quote {
            nights,
            subtotal: subtotal.round_dp(MONEY_PRECISION),
            tax: tax.round_dp(MONEY_PRECISION),
            total: total.round_dp(MONEY_PRECISION),
        })
    }
}

fn price_overflow() -> MarketplaceError {
    MarketplaceError::invalid("price is too large")
}

/// Price breakdown of a stay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub nights: i64,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// Total price of a stay, tax included.
///
/// # Errors
///
/// [`MarketplaceError::InvalidRange`] if `nights <= 0`.
pub fn compute(
    base_rate: Decimal,
    weekly_rate: Decimal,
    tax_percent: Decimal,
    nights: i64,
) -> Result<Decimal, MarketplaceError> {
    Rates::new(base_rate, weekly_rate, tax_percent)
        .quote(nights)
        .map(|quote| quote.total)
}
