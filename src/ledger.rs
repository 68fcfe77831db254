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

//! Booking ledger.
//!
//! Every property has its own [`Calendar`] behind a mutex. Creating a
//! booking, cancelling it and completing it all happen while holding that
//! mutex, so the availability check and the insert cannot be interleaved
//! with another writer for the same property.
//!
//! Lock order: calendar mutex, then booking map shard. A shard guard is
//! never held while waiting on a calendar.

use crate::base::{BookingId, PropertyId, Sequence, UserId};
use crate::booking::{Booking, BookingStatus, GuestDetails};
use crate::calendar::Calendar;
use crate::property::Property;
use crate::stay::Stay;
use crate::MarketplaceError;
use chrono::NaiveDate;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct BookingLedger {
    bookings: DashMap<BookingId, Booking>,
    calendars: DashMap<PropertyId, Arc<Mutex<Calendar>>>,
    ids: Sequence,
}

impl BookingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clones the calendar handle out of the map so the shard guard is
    /// released before the mutex is taken.
    fn calendar(&self, property_id: PropertyId) -> Arc<Mutex<Calendar>> {
        Arc::clone(self.calendars.entry(property_id).or_default().value())
    }

    /// Whether `stay` is free at `property_id`.
    pub fn is_available(&self, property_id: PropertyId, stay: &Stay) -> bool {
        match self.calendars.get(&property_id).map(|c| Arc::clone(c.value())) {
            Some(calendar) => calendar.lock().is_free(stay),
            None => true,
        }
    }

    /// Creates a pending booking if the dates are free.
    ///
    /// # Errors
    ///
    /// - [`MarketplaceError::InvalidInput`] - Guest count or contact details invalid.
    /// - [`MarketplaceError::DatesUnavailable`] - An active booking overlaps `stay`.
    pub fn reserve(
        &self,
        property: &Property,
        guest: UserId,
        stay: Stay,
        guests: u32,
        guest_details: GuestDetails,
    ) -> Result<Booking, MarketplaceError> {
        if guests == 0 {
            return Err(MarketplaceError::invalid("guest count must be at least 1"));
        }
        guest_details.validate()?;
        let total_price = property.rates.quote(stay.nights())?.total;

        let calendar = self.calendar(property.id);
        let mut calendar = calendar.lock();

        if let Some(conflict) = calendar.conflict(&stay) {
            debug!(
                property = %property.id,
                conflicting_booking = %conflict,
                check_in = %stay.check_in(),
                check_out = %stay.check_out(),
                "booking rejected, dates unavailable"
            );
            return Err(MarketplaceError::DatesUnavailable);
        }

        let booking = Booking::new(
            BookingId(self.ids.next()),
            property.id,
            guest,
            property.host_id,
            stay,
            guests,
            total_price,
            guest_details,
        );
        calendar.reserve(booking.id, stay)?;
        self.bookings.insert(booking.id, booking.clone());

        info!(
            booking = %booking.id,
            property = %property.id,
            guest = %guest,
            nights = stay.nights(),
            total = %booking.total_price,
            "booking created"
        );
        Ok(booking)
    }

    /// Applies a guest- or host-requested status change.
    ///
    /// # Errors
    ///
    /// - [`MarketplaceError::BookingNotFound`] - Unknown booking.
    /// - [`MarketplaceError::NotBookingParty`] - Actor is neither guest nor host.
    /// - [`MarketplaceError::ConfirmationRequiresHost`] - Guest tried to confirm.
    /// - [`MarketplaceError::InvalidTransition`] - State machine forbids the change.
    pub fn transition(
        &self,
        booking_id: BookingId,
        actor: UserId,
        to: BookingStatus,
    ) -> Result<Booking, MarketplaceError> {
        let property_id = self
            .bookings
            .get(&booking_id)
            .map(|booking| booking.property_id)
            .ok_or(MarketplaceError::BookingNotFound)?;

        let calendar = self.calendar(property_id);
        let mut calendar = calendar.lock();

        let mut booking = self
            .bookings
            .get_mut(&booking_id)
            .ok_or(MarketplaceError::BookingNotFound)?;
        let from = booking.status;
        booking.request_status(actor, to)?;
        if !booking.status.holds_dates() {
            calendar.release(booking.id, &booking.stay);
        }

        info!(booking = %booking_id, %from, %to, actor = %actor, "booking status changed");
        Ok(booking.clone())
    }

    /// Completes every confirmed booking whose check-out is on or before
    /// `today`, returning the bookings changed by this call.
    pub fn sweep_completions(&self, today: NaiveDate) -> Vec<Booking> {
        let due: Vec<(BookingId, PropertyId)> = self
            .bookings
            .iter()
            .filter(|entry| entry.is_due(today))
            .map(|entry| (entry.id, entry.property_id))
            .collect();

        let mut completed = Vec::with_capacity(due.len());
        for (booking_id, property_id) in due {
            let calendar = self.calendar(property_id);
            let mut calendar = calendar.lock();
            let Some(mut booking) = self.bookings.get_mut(&booking_id) else {
                continue;
            };
            // Re-checked under the lock: a cancellation may have won the race.
            if booking.complete_if_due(today) {
                calendar.release(booking.id, &booking.stay);
                completed.push(booking.clone());
            }
        }

        if !completed.is_empty() {
            info!(count = completed.len(), %today, "bookings completed");
        }
        completed
    }

    pub fn get(&self, booking_id: BookingId) -> Result<Booking, MarketplaceError> {
        self.bookings
            .get(&booking_id)
            .map(|booking| booking.clone())
            .ok_or(MarketplaceError::BookingNotFound)
    }

    fn collect_newest_first(&self, keep: impl Fn(&Booking) -> bool) -> Vec<Booking> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        bookings.sort_by(|a, b| b.id.cmp(&a.id));
        bookings
    }

    pub fn for_guest(&self, guest: UserId) -> Vec<Booking> {
        self.collect_newest_first(|booking| booking.guest_id == guest)
    }

    pub fn for_host(&self, host: UserId) -> Vec<Booking> {
        self.collect_newest_first(|booking| booking.host_id == host)
    }

    /// Completed stays of `guest` at `property_id`, oldest first.
    pub fn completed_stays(&self, property_id: PropertyId, guest: UserId) -> Vec<Booking> {
        let mut bookings = self.collect_newest_first(|booking| {
            booking.property_id == property_id
                && booking.guest_id == guest
                && booking.status == BookingStatus::Completed
        });
        bookings.reverse();
        bookings
    }

    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }
}
