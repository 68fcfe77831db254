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

//! Booking records and their status state machine.
//!
//! ```text
//!  Pending ──confirm (host)──► Confirmed ──checkout passed (sweep)──► Completed
//!     │                            │
//!     └──cancel (guest/host)──► Cancelled ◄──cancel (guest/host)──┘
//! ```

use crate::base::{BookingId, PropertyId, UserId};
use crate::stay::Stay;
use crate::MarketplaceError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Pending and confirmed bookings block their dates.
    pub fn holds_dates(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Transitions a guest or host may request. Completion is reserved for
    /// the sweep.
    pub fn can_request(self, to: BookingStatus) -> bool {
        matches!(
            (self, to),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Payment is not processed by the marketplace; the status is carried for
/// clients only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// Guest contact details copied into the booking at reservation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub government_id: Option<String>,
}

impl GuestDetails {
    pub(crate) fn validate(&self) -> Result<(), MarketplaceError> {
        if self.name.trim().is_empty() {
            return Err(MarketplaceError::invalid("guest name is required"));
        }
        if self.phone.trim().is_empty() {
            return Err(MarketplaceError::invalid("guest phone is required"));
        }
        if !is_valid_email(self.email.trim()) {
            return Err(MarketplaceError::invalid("guest email is invalid"));
        }
        Ok(())
    }
}

/// `local@domain.tld` with no whitespace.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((name, tld)) => !name.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// A reservation of a property by a guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Booking {
    pub id: BookingId,
    pub property_id: PropertyId,
    pub guest_id: UserId,
    /// Copied from the property at creation time.
    pub host_id: UserId,
    #[serde(flatten)]
    pub stay: Stay,
    pub guests: u32,
    /// Price snapshot; never recomputed.
    pub total_price: Decimal,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub guest_details: GuestDetails,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: BookingId,
        property_id: PropertyId,
        guest_id: UserId,
        host_id: UserId,
        stay: Stay,
        guests: u32,
        total_price: Decimal,
        guest_details: GuestDetails,
    ) -> Self {
        Self {
            id,
            property_id,
            guest_id,
            host_id,
            stay,
            guests,
            total_price,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            guest_details,
            created_at: Utc::now(),
        }
    }

    pub fn is_party(&self, user: UserId) -> bool {
        self.guest_id == user || self.host_id == user
    }

    /// Applies a status change requested by `actor`.
    ///
    /// # Errors
    ///
    /// - [`MarketplaceError::NotBookingParty`] - Actor is neither guest nor host.
    /// - [`MarketplaceError::ConfirmationRequiresHost`] - Guest tried to confirm.
    /// - [`MarketplaceError::InvalidTransition`] - State machine forbids the change.
    pub(crate) fn request_status(
        &mut self,
        actor: UserId,
        to: BookingStatus,
    ) -> Result<(), MarketplaceError> {
        if !self.is_party(actor) {
            return Err(MarketplaceError::NotBookingParty);
        }
        if !self.status.can_request(to) {
            return Err(MarketplaceError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        if to == BookingStatus::Confirmed && actor != self.host_id {
            return Err(MarketplaceError::ConfirmationRequiresHost);
        }
        self.status = to;
        Ok(())
    }

    /// Marks a confirmed stay as completed once its check-out day is reached.
    ///
    /// Returns whether the status changed; a second call is a no-op.
    pub(crate) fn complete_if_due(&mut self, today: NaiveDate) -> bool {
        if self.is_due(today) {
            self.status = BookingStatus::Completed;
            true
        } else {
            false
        }
    }

    pub(crate) fn is_due(&self, today: NaiveDate) -> bool {
        self.status == BookingStatus::Confirmed && self.stay.check_out() <= today
    }
}
