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

//! Outgoing user notifications.
//!
//! Booking and review events enqueue notifications without blocking; a
//! dispatcher drains the outbox in FIFO order.

use crate::base::{BookingId, PropertyId, UserId};
use crate::booking::{Booking, BookingStatus};
use crate::review::Review;
use chrono::{DateTime, Utc};
use crossbeam::queue::SegQueue;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingRequest,
    BookingConfirmed,
    BookingCancelled,
    BookingCompleted,
    ReviewReceived,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub recipient: UserId,
    pub sender: Option<UserId>,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub property_id: PropertyId,
    pub booking_id: Option<BookingId>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// New reservation request, sent to the host.
    pub fn booking_request(booking: &Booking) -> Self {
        Self {
            recipient: booking.host_id,
            sender: Some(booking.guest_id),
            kind: NotificationKind::BookingRequest,
            title: "New booking request".to_string(),
            message: format!(
                "{} requested {} to {} for {} guest(s)",
                booking.guest_details.name,
                booking.stay.check_in(),
                booking.stay.check_out(),
                booking.guests
            ),
            property_id: booking.property_id,
            booking_id: Some(booking.id),
            created_at: Utc::now(),
        }
    }

    /// Status change made by `actor`, sent to the other party.
    pub fn status_changed(booking: &Booking, actor: UserId) -> Option<Self> {
        let (kind, title) = match booking.status {
            BookingStatus::Confirmed => {
                (NotificationKind::BookingConfirmed, "Booking confirmed")
            }
            BookingStatus::Cancelled => {
                (NotificationKind::BookingCancelled, "Booking cancelled")
            }
            _ => return None,
        };
        let recipient = if actor == booking.host_id {
            booking.guest_id
        } else {
            booking.host_id
        };
        Some(Self {
            recipient,
            sender: Some(actor),
            kind,
            title: title.to_string(),
            message: format!(
                "Booking {} for {} to {} is now {}",
                booking.id,
                booking.stay.check_in(),
                booking.stay.check_out(),
                booking.status
            ),
            property_id: booking.property_id,
            booking_id: Some(booking.id),
            created_at: Utc::now(),
        })
    }

    /// Stay finished, sent to the guest as an invitation to review.
    pub fn stay_completed(booking: &Booking) -> Self {
        Self {
            recipient: booking.guest_id,
            sender: None,
            kind: NotificationKind::BookingCompleted,
            title: "How was your stay?".to_string(),
            message: format!("Booking {} is complete; you can now leave a review", booking.id),
            property_id: booking.property_id,
            booking_id: Some(booking.id),
            created_at: Utc::now(),
        }
    }

    /// New review, sent to the host.
    pub fn review_received(review: &Review) -> Self {
        Self {
            recipient: review.host_id,
            sender: Some(review.guest_id),
            kind: NotificationKind::ReviewReceived,
            title: "New review".to_string(),
            message: format!("A guest rated their stay {}/5", review.rating),
            property_id: review.property_id,
            booking_id: Some(review.booking_id),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Outbox {
    queue: SegQueue<Notification>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, notification: Notification) {
        self.queue.push(notification);
    }

    /// Removes and returns every queued notification, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        let mut drained = Vec::with_capacity(self.queue.len());
        while let Some(notification) = self.queue.pop() {
            drained.push(notification);
        }
        drained
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
