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

//! # StayFinder
//!
//! This library provides the core of a property-rental marketplace: hosts
//! list properties, guests check availability, book stays, review completed
//! stays and keep favorites.
//!
//! ## Core Components
//!
//! - [`Marketplace`]: Entry point wiring every store together
//! - [`Calendar`]: Per-property reservation calendar with conflict detection
//! - [`Booking`]: Reservation record and its status state machine
//! - [`pricing`]: Two-tier nightly pricing with tax
//! - [`MarketplaceError`]: Error types for failed operations
//!
//! ## Example
//!
//! ```
//! use stayfinder::{Actor, BookingRequest, BookingStatus, GuestDetails, Marketplace};
//! use stayfinder::{Coordinates, NewProperty, Rates};
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//!
//! let marketplace = Marketplace::new();
//! let host = Actor::host(1);
//! let guest = Actor::guest(2);
//!
//! let property = marketplace
//!     .list_property(&host, NewProperty {
//!         title: "Sea View Flat".to_string(),
//!         description: "Two bedrooms by the beach".to_string(),
//!         location: "Panaji, Goa".to_string(),
//!         coordinates: Coordinates { lat: 15.49, lng: 73.82 },
//!         rates: Rates::new(dec!(1000), dec!(800), dec!(10)),
//!         amenities: vec!["wifi".to_string()],
//!         cover_photo: "/uploads/flat.jpg".to_string(),
//!         images: vec![],
//!     })
//!     .unwrap();
//!
//! let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
//! let booking = marketplace
//!     .create_booking(&guest, BookingRequest {
//!         property_id: property.id,
//!         check_in: day(10),
//!         check_out: day(15),
//!         guests: 2,
//!         guest_details: GuestDetails {
//!             name: "Asha".to_string(),
//!             email: "asha@example.com".to_string(),
//!             phone: "9999999999".to_string(),
//!             address: None,
//!             government_id: None,
//!         },
//!     })
//!     .unwrap();
//! assert_eq!(booking.total_price, dec!(5500));
//! assert_eq!(booking.status, BookingStatus::Pending);
//!
//! // Overlapping dates are taken; back-to-back stays are not.
//! assert!(!marketplace.is_available(property.id, day(12), day(20)).unwrap());
//! assert!(marketplace.is_available(property.id, day(15), day(20)).unwrap());
//! ```
//!
//! ## Thread Safety
//!
//! All stores are sharded concurrent maps. Writers touching the same
//! property serialise on a per-property lock, so concurrent bookings for
//! overlapping dates cannot both succeed.

pub mod api;
mod base;
pub mod booking;
pub mod calendar;
pub mod config;
pub mod error;
pub mod favorites;
pub mod ledger;
pub mod marketplace;
pub mod notification;
pub mod pricing;
pub mod property;
pub mod review;
pub mod seed;
pub mod server;
mod stay;

pub use base::{Actor, BookingId, FavoriteId, PropertyId, ReviewId, Role, UserId};
pub use booking::{Booking, BookingStatus, GuestDetails, PaymentStatus};
pub use calendar::Calendar;
pub use config::Config;
pub use error::{ErrorKind, MarketplaceError};
pub use favorites::Favorite;
pub use marketplace::{BookingRequest, Marketplace};
pub use notification::{Notification, NotificationKind};
pub use pricing::{Quote, Rates};
pub use property::{Coordinates, NewProperty, Property, PropertyPage, PropertyQuery, PropertyUpdate};
pub use review::{CategoryRatings, NewReview, Review, ReviewEligibility, ReviewPage, ReviewStats};
pub use stay::Stay;
