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

//! Guest reviews and property rating aggregation.
//!
//! A review can only be written for a completed booking, once. Every
//! insertion recomputes the property's mean rating inside the same critical
//! section, so concurrent reviews of one property never lose an update.

use crate::base::{BookingId, PropertyId, ReviewId, Sequence, UserId};
use crate::booking::{Booking, BookingStatus};
use crate::property::{Page, Property};
use crate::MarketplaceError;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

pub const MAX_COMMENT_LEN: usize = 1000;

/// Averages are reported to two decimal places.
const AVERAGE_PRECISION: u32 = 2;

/// Optional 1-5 sub-ratings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryRatings {
    pub cleanliness: Option<u8>,
    pub communication: Option<u8>,
    pub check_in: Option<u8>,
    pub accuracy: Option<u8>,
    pub location: Option<u8>,
    pub value: Option<u8>,
}

impl CategoryRatings {
    fn entries(&self) -> [(&'static str, Option<u8>); 6] {
        [
            ("cleanliness", self.cleanliness),
            ("communication", self.communication),
            ("check_in", self.check_in),
            ("accuracy", self.accuracy),
            ("location", self.location),
            ("value", self.value),
        ]
    }
}

fn validate_score(field: &str, score: u8) -> Result<(), MarketplaceError> {
    if !(1..=5).contains(&score) {
        return Err(MarketplaceError::invalid(format!("{field} must be between 1 and 5")));
    }
    Ok(())
}

/// A review as submitted by a guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    pub property_id: PropertyId,
    pub booking_id: BookingId,
    pub rating: u8,
    pub comment: String,
    #[serde(flatten)]
    pub categories: CategoryRatings,
}

impl NewReview {
    pub(crate) fn validate(&self) -> Result<(), MarketplaceError> {
        validate_score("rating", self.rating)?;
        for (field, score) in self.categories.entries() {
            if let Some(score) = score {
                validate_score(field, score)?;
            }
        }
        if self.comment.trim().is_empty() {
            return Err(MarketplaceError::invalid("comment is required"));
        }
        if self.comment.chars().count() > MAX_COMMENT_LEN {
            return Err(MarketplaceError::invalid(format!(
                "comment must be at most {MAX_COMMENT_LEN} characters"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub property_id: PropertyId,
    pub booking_id: BookingId,
    pub guest_id: UserId,
    pub host_id: UserId,
    pub rating: u8,
    pub comment: String,
    #[serde(flatten)]
    pub categories: CategoryRatings,
    /// Always true: reviews only come from completed stays.
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryAverages {
    pub cleanliness: Decimal,
    pub communication: Decimal,
    pub check_in: Decimal,
    pub accuracy: Decimal,
    pub location: Decimal,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewStats {
    pub total_reviews: usize,
    pub average_rating: Decimal,
    /// Count of reviews per overall rating, keys 1 through 5.
    pub rating_distribution: BTreeMap<u8, usize>,
    pub category_averages: CategoryAverages,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewPage {
    pub reviews: Vec<Review>,
    pub total: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReviewEligibility {
    pub eligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<BookingId>,
}

/// Running sum of overall ratings for one property.
#[derive(Debug, Default)]
struct RatingTally {
    count: u32,
    sum: u32,
}

impl RatingTally {
    fn add(&mut self, rating: u8) {
        self.count += 1;
        self.sum += u32::from(rating);
    }

    fn mean(&self) -> Decimal {
        mean(Decimal::from(self.sum), self.count as usize)
    }
}

fn mean(sum: Decimal, count: usize) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    (sum / Decimal::from(count)).round_dp(AVERAGE_PRECISION)
}

#[derive(Debug, Default)]
pub struct ReviewLedger {
    reviews: DashMap<ReviewId, Review>,
    /// Uniqueness index: at most one review per booking.
    by_booking: DashMap<BookingId, ReviewId>,
    tallies: DashMap<PropertyId, Arc<Mutex<RatingTally>>>,
    ids: Sequence,
}

impl ReviewLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a review and publishes the new aggregate rating.
    ///
    /// `publish` runs while the property's tally is locked, so aggregate
    /// writes are applied in the same order as insertions.
    ///
    /// # Errors
    ///
    /// - [`MarketplaceError::InvalidInput`] - Bad scores or comment, or the booking
    ///   belongs to another property.
    /// - [`MarketplaceError::NotBookingGuest`] - `guest` did not make the booking.
    /// - [`MarketplaceError::BookingNotCompleted`] - Stay is not completed yet.
    /// - [`MarketplaceError::AlreadyReviewed`] - Booking already has a review.
    pub fn submit<F>(
        &self,
        property: &Property,
        booking: &Booking,
        guest: UserId,
        review: NewReview,
        publish: F,
    ) -> Result<Review, MarketplaceError>
    where
        F: FnOnce(PropertyId, Decimal, u32),
    {
        review.validate()?;
        if booking.property_id != property.id {
            return Err(MarketplaceError::invalid("booking does not belong to this property"));
        }
        if booking.guest_id != guest {
            return Err(MarketplaceError::NotBookingGuest);
        }
        if booking.status != BookingStatus::Completed {
            return Err(MarketplaceError::BookingNotCompleted);
        }

        let tally = Arc::clone(self.tallies.entry(property.id).or_default().value());
        let mut tally = tally.lock();

        let id = match self.by_booking.entry(booking.id) {
            Entry::Occupied(_) => return Err(MarketplaceError::AlreadyReviewed),
            Entry::Vacant(entry) => {
                let id = ReviewId(self.ids.next());
                entry.insert(id);
                id
            }
        };

        let review = Review {
            id,
            property_id: property.id,
            booking_id: booking.id,
            guest_id: guest,
            host_id: property.host_id,
            rating: review.rating,
            comment: review.comment.trim().to_string(),
            categories: review.categories,
            verified: true,
            created_at: Utc::now(),
        };
        self.reviews.insert(id, review.clone());

        tally.add(review.rating);
        publish(property.id, tally.mean(), tally.count);

        info!(
            review = %id,
            property = %property.id,
            rating = review.rating,
            "review recorded"
        );
        Ok(review)
    }

    pub fn has_review(&self, booking_id: BookingId) -> bool {
        self.by_booking.contains_key(&booking_id)
    }

    fn for_property_sorted(&self, property_id: PropertyId) -> Vec<Review> {
        let mut reviews: Vec<Review> = self
            .reviews
            .iter()
            .filter(|entry| entry.property_id == property_id)
            .map(|entry| entry.value().clone())
            .collect();
        reviews.sort_by(|a, b| b.id.cmp(&a.id));
        reviews
    }

    /// Reviews of a property, newest first.
    pub fn for_property(
        &self,
        property_id: PropertyId,
        page: Option<usize>,
        limit: Option<usize>,
    ) -> ReviewPage {
        let page = Page::new(page, limit);
        let all = self.for_property_sorted(property_id);
        let total = all.len();
        ReviewPage {
            reviews: all.into_iter().skip(page.offset()).take(page.size).collect(),
            total,
            total_pages: page.total_pages(total),
            current_page: page.number,
        }
    }

    /// Rating statistics. Category averages only count reviews that carry
    /// that sub-rating.
    pub fn stats(&self, property_id: PropertyId) -> ReviewStats {
        let reviews = self.for_property_sorted(property_id);

        let mut rating_distribution: BTreeMap<u8, usize> = (1..=5).map(|r| (r, 0)).collect();
        let mut rating_sum = Decimal::ZERO;
        // (sum, count) per category, in `CategoryRatings::entries` order.
        let mut categories = [(Decimal::ZERO, 0usize); 6];

        for review in &reviews {
            *rating_distribution.entry(review.rating).or_insert(0) += 1;
            rating_sum += Decimal::from(review.rating);
            for (slot, (_, score)) in categories.iter_mut().zip(review.categories.entries()) {
                if let Some(score) = score {
                    slot.0 += Decimal::from(score);
                    slot.1 += 1;
                }
            }
        }

        let [cleanliness, communication, check_in, accuracy, location, value] =
            categories.map(|(sum, count)| mean(sum, count));

        ReviewStats {
            total_reviews: reviews.len(),
            average_rating: mean(rating_sum, reviews.len()),
            rating_distribution,
            category_averages: CategoryAverages {
                cleanliness,
                communication,
                check_in,
                accuracy,
                location,
                value,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }
}
