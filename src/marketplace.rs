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

//! Marketplace façade.
//!
//! The [`Marketplace`] wires the stores together and is the single entry
//! point used by the REST layer, the listing importer and the tests.
//!
//! # Operations
//!
//! - **Listings**: create, edit, soft-delete and search properties.
//! - **Availability**: check a date range and quote its price.
//! - **Bookings**: create, confirm, cancel, and complete past stays.
//! - **Reviews**: one review per completed booking; aggregate rating.
//! - **Favorites**: per-user set of listings.
//!
//! Booking and review events enqueue [`Notification`]s which a dispatcher
//! drains with [`Marketplace::drain_notifications`].
//!
//! # Thread Safety
//!
//! Every method takes `&self`. Writers for the same property are serialised
//! by that property's calendar or rating lock; different properties proceed
//! in parallel.

use crate::base::{Actor, PropertyId};
use crate::booking::{Booking, BookingStatus, GuestDetails};
use crate::favorites::{Favorite, FavoritesSet};
use crate::ledger::BookingLedger;
use crate::notification::{Notification, Outbox};
use crate::pricing::Quote;
use crate::property::{
    NewProperty, Property, PropertyDirectory, PropertyPage, PropertyQuery, PropertyUpdate,
};
use crate::review::{NewReview, Review, ReviewEligibility, ReviewLedger, ReviewPage, ReviewStats};
use crate::stay::Stay;
use crate::{BookingId, MarketplaceError};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A guest's reservation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub property_id: PropertyId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    pub guest_details: GuestDetails,
}

/// The property-rental marketplace.
///
/// # Invariants
///
/// - For any property, bookings in `pending` or `confirmed` never overlap.
/// - A booking carries at most one review, and only once `completed`.
/// - `Property::rating` is the mean of the property's reviews.
#[derive(Debug, Default)]
pub struct Marketplace {
    properties: PropertyDirectory,
    bookings: BookingLedger,
    reviews: ReviewLedger,
    favorites: FavoritesSet,
    outbox: Outbox,
}

impl Marketplace {
    pub fn new() -> Self {
        Self::default()
    }

    // === Listings ===

    /// Publishes a new listing owned by `actor`.
    ///
    /// # Errors
    ///
    /// - [`MarketplaceError::HostRoleRequired`] - Caller is a guest.
    /// - [`MarketplaceError::InvalidInput`] - A required field is missing or invalid.
    pub fn list_property(
        &self,
        actor: &Actor,
        draft: NewProperty,
    ) -> Result<Property, MarketplaceError> {
        let property = self.properties.create(actor, draft)?;
        debug!(property = %property.id, host = %actor.user_id, "property listed");
        Ok(property)
    }

    /// Any listing by id, including deactivated ones.
    pub fn property(&self, id: PropertyId) -> Result<Property, MarketplaceError> {
        self.properties.get(id)
    }

    pub fn update_property(
        &self,
        actor: &Actor,
        id: PropertyId,
        update: PropertyUpdate,
    ) -> Result<Property, MarketplaceError> {
        self.properties.update(actor, id, update)
    }

    /// Soft-deletes a listing. Its bookings and reviews are kept.
    pub fn deactivate_property(
        &self,
        actor: &Actor,
        id: PropertyId,
    ) -> Result<Property, MarketplaceError> {
        let property = self.properties.deactivate(actor, id)?;
        debug!(property = %id, "property deactivated");
        Ok(property)
    }

    pub fn search_properties(&self, query: &PropertyQuery) -> PropertyPage {
        self.properties.search(query)
    }

    /// The caller's own listings, deactivated ones included.
    ///
    /// # Errors
    ///
    /// [`MarketplaceError::HostRoleRequired`] if the caller is a guest.
    pub fn host_properties(&self, actor: &Actor) -> Result<Vec<Property>, MarketplaceError> {
        if !actor.can_host() {
            return Err(MarketplaceError::HostRoleRequired);
        }
        Ok(self.properties.hosted_by(actor.user_id))
    }

    // === Availability ===

    /// Whether `[check_in, check_out)` is free at an active listing.
    ///
    /// # Errors
    ///
    /// - [`MarketplaceError::InvalidRange`] - `check_out <= check_in`.
    /// - [`MarketplaceError::PropertyNotFound`] - Unknown or deactivated listing.
    pub fn is_available(
        &self,
        property_id: PropertyId,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<bool, MarketplaceError> {
        let stay = Stay::new(check_in, check_out)?;
        self.properties.active(property_id)?;
        Ok(self.bookings.is_available(property_id, &stay))
    }

    /// Price breakdown for a stay at an active listing.
    pub fn quote(
        &self,
        property_id: PropertyId,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<Quote, MarketplaceError> {
        let stay = Stay::new(check_in, check_out)?;
        let property = self.properties.active(property_id)?;
        property.rates.quote(stay.nights())
    }

    // === Bookings ===

    /// Reserves a stay for `actor` and notifies the host.
    ///
    /// The price is computed here; clients never supply it.
    ///
    /// # Errors
    ///
    /// - [`MarketplaceError::PropertyNotFound`] - Unknown or deactivated listing.
    /// - [`MarketplaceError::InvalidRange`] - `check_out <= check_in`.
    /// - [`MarketplaceError::InvalidInput`] - Guest count or contact details invalid.
    /// - [`MarketplaceError::DatesUnavailable`] - The dates overlap an active booking.
    pub fn create_booking(
        &self,
        actor: &Actor,
        request: BookingRequest,
    ) -> Result<Booking, MarketplaceError> {
        let property = self.properties.active(request.property_id)?;
        let stay = Stay::new(request.check_in, request.check_out)?;
        let booking = self.bookings.reserve(
            &property,
            actor.user_id,
            stay,
            request.guests,
            request.guest_details,
        )?;
        self.outbox.push(Notification::booking_request(&booking));
        Ok(booking)
    }

    /// A booking visible to its guest or host.
    ///
    /// # Errors
    ///
    /// - [`MarketplaceError::BookingNotFound`] - Unknown booking.
    /// - [`MarketplaceError::NotBookingParty`] - Caller is neither guest nor host.
    pub fn booking(&self, actor: &Actor, id: BookingId) -> Result<Booking, MarketplaceError> {
        let booking = self.bookings.get(id)?;
        if !booking.is_party(actor.user_id) {
            return Err(MarketplaceError::NotBookingParty);
        }
        Ok(booking)
    }

    /// Bookings made by the caller, newest first.
    pub fn guest_bookings(&self, actor: &Actor) -> Vec<Booking> {
        self.bookings.for_guest(actor.user_id)
    }

    /// Bookings on the caller's listings, newest first.
    ///
    /// # Errors
    ///
    /// [`MarketplaceError::HostRoleRequired`] if the caller is a guest.
    pub fn host_bookings(&self, actor: &Actor) -> Result<Vec<Booking>, MarketplaceError> {
        if !actor.can_host() {
            return Err(MarketplaceError::HostRoleRequired);
        }
        Ok(self.bookings.for_host(actor.user_id))
    }

    /// Confirms or cancels a booking and notifies the other party.
    ///
    /// # Errors
    ///
    /// - [`MarketplaceError::BookingNotFound`] - Unknown booking.
    /// - [`MarketplaceError::NotBookingParty`] - Caller is neither guest nor host.
    /// - [`MarketplaceError::ConfirmationRequiresHost`] - Guest tried to confirm.
    /// - [`MarketplaceError::InvalidTransition`] - State machine forbids the change.
    pub fn update_booking_status(
        &self,
        actor: &Actor,
        id: BookingId,
        status: BookingStatus,
    ) -> Result<Booking, MarketplaceError> {
        let booking = self.bookings.transition(id, actor.user_id, status)?;
        if let Some(notification) = Notification::status_changed(&booking, actor.user_id) {
            self.outbox.push(notification);
        }
        Ok(booking)
    }

    /// Completes every confirmed booking checked out on or before `today`.
    ///
    /// Returns only the bookings changed by this call; a second call with
    /// the same date returns nothing.
    pub fn sweep_completions(&self, today: NaiveDate) -> Vec<Booking> {
        let completed = self.bookings.sweep_completions(today);
        for booking in &completed {
            self.outbox.push(Notification::stay_completed(booking));
        }
        completed
    }

    /// [`Marketplace::sweep_completions`] for the current UTC date.
    pub fn sweep_completions_now(&self) -> Vec<Booking> {
        self.sweep_completions(Utc::now().date_naive())
    }

    // === Reviews ===

    /// Records a review for a completed stay and refreshes the listing's
    /// rating.
    ///
    /// # Errors
    ///
    /// - [`MarketplaceError::PropertyNotFound`] / [`MarketplaceError::BookingNotFound`]
    /// - [`MarketplaceError::InvalidInput`] - Bad scores or comment, or the
    ///   booking belongs to another listing.
    /// - [`MarketplaceError::NotBookingGuest`] - Caller did not make the booking.
    /// - [`MarketplaceError::BookingNotCompleted`] - Stay is not completed yet.
    /// - [`MarketplaceError::AlreadyReviewed`] - Booking already has a review.
    pub fn submit_review(
        &self,
        actor: &Actor,
        review: NewReview,
    ) -> Result<Review, MarketplaceError> {
        let property = self.properties.get(review.property_id)?;
        let booking = self.bookings.get(review.booking_id)?;
        let review = self.reviews.submit(
            &property,
            &booking,
            actor.user_id,
            review,
            |property_id, rating, count| self.properties.set_rating(property_id, rating, count),
        )?;
        self.outbox.push(Notification::review_received(&review));
        Ok(review)
    }

    pub fn property_reviews(
        &self,
        property_id: PropertyId,
        page: Option<usize>,
        limit: Option<usize>,
    ) -> Result<ReviewPage, MarketplaceError> {
        self.properties.get(property_id)?;
        Ok(self.reviews.for_property(property_id, page, limit))
    }

    pub fn review_stats(&self, property_id: PropertyId) -> Result<ReviewStats, MarketplaceError> {
        self.properties.get(property_id)?;
        Ok(self.reviews.stats(property_id))
    }

    /// Whether `actor` has a completed, unreviewed stay at the listing.
    /// The oldest such booking is returned.
    pub fn can_review(
        &self,
        actor: &Actor,
        property_id: PropertyId,
    ) -> Result<ReviewEligibility, MarketplaceError> {
        self.properties.get(property_id)?;
        let booking_id = self
            .bookings
            .completed_stays(property_id, actor.user_id)
            .into_iter()
            .map(|booking| booking.id)
            .find(|id| !self.reviews.has_review(*id));
        Ok(ReviewEligibility {
            eligible: booking_id.is_some(),
            booking_id,
        })
    }

    // === Favorites ===

    /// # Errors
    ///
    /// - [`MarketplaceError::PropertyNotFound`] - Unknown or deactivated listing.
    /// - [`MarketplaceError::AlreadyFavorited`] - Already in the caller's favorites.
    pub fn add_favorite(
        &self,
        actor: &Actor,
        property_id: PropertyId,
    ) -> Result<Favorite, MarketplaceError> {
        self.properties.active(property_id)?;
        self.favorites.add(actor.user_id, property_id)
    }

    pub fn remove_favorite(
        &self,
        actor: &Actor,
        property_id: PropertyId,
    ) -> Result<(), MarketplaceError> {
        self.favorites.remove(actor.user_id, property_id)
    }

    /// The caller's favorited listings. Deactivated or missing listings are
    /// skipped.
    pub fn favorites(&self, actor: &Actor) -> Vec<Property> {
        self.favorites
            .property_ids(actor.user_id)
            .into_iter()
            .filter_map(|id| self.properties.active(id).ok())
            .collect()
    }

    // === Notifications ===

    /// Takes every pending notification, oldest first.
    pub fn drain_notifications(&self) -> Vec<Notification> {
        self.outbox.drain()
    }

    pub fn pending_notifications(&self) -> usize {
        self.outbox.len()
    }
}
