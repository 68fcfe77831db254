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

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use stayfinder::{
    Actor, Booking, BookingId, BookingRequest, BookingStatus, CategoryRatings, Coordinates,
    ErrorKind, GuestDetails, Marketplace, MarketplaceError, NewProperty, NotificationKind,
    Property, PropertyId, PropertyUpdate, Rates, UserId,
};

const HOST: u64 = 1;
const GUEST: u64 = 2;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn draft(title: &str) -> NewProperty {
    NewProperty {
        title: title.to_string(),
        description: "Two bedrooms by the beach".to_string(),
        location: "Panaji, Goa".to_string(),
        coordinates: Coordinates {
            lat: 15.49,
            lng: 73.82,
        },
        rates: Rates::new(dec!(1000), dec!(800), dec!(10)),
        amenities: vec!["wifi".to_string(), "kitchen".to_string()],
        cover_photo: "/uploads/cover.jpg".to_string(),
        images: vec!["/uploads/1.jpg".to_string()],
    }
}

fn details() -> GuestDetails {
    GuestDetails {
        name: "Asha".to_string(),
        email: "asha@example.com".to_string(),
        phone: "9999999999".to_string(),
        address: None,
        government_id: None,
    }
}

fn request(property_id: PropertyId, check_in: u32, check_out: u32) -> BookingRequest {
    BookingRequest {
        property_id,
        check_in: day(check_in),
        check_out: day(check_out),
        guests: 2,
        guest_details: details(),
    }
}

fn setup() -> (Marketplace, Property) {
    let marketplace = Marketplace::new();
    let property = marketplace
        .list_property(&Actor::host(HOST), draft("Sea View Flat"))
        .unwrap();
    (marketplace, property)
}

fn completed_stay(marketplace: &Marketplace, property: &Property, from: u32, to: u32) -> Booking {
    let booking = marketplace
        .create_booking(&Actor::guest(GUEST), request(property.id, from, to))
        .unwrap();
    marketplace
        .update_booking_status(&Actor::host(HOST), booking.id, BookingStatus::Confirmed)
        .unwrap();
    marketplace.sweep_completions(day(to));
    marketplace.booking(&Actor::guest(GUEST), booking.id).unwrap()
}

fn review(property: &Property, booking_id: BookingId, rating: u8) -> stayfinder::NewReview {
    stayfinder::NewReview {
        property_id: property.id,
        booking_id,
        rating,
        comment: "Great stay".to_string(),
        categories: CategoryRatings::default(),
    }
}

// === Availability ===

#[test]
fn availability_around_confirmed_booking() {
    let (marketplace, property) = setup();
    let booking = marketplace
        .create_booking(&Actor::guest(GUEST), request(property.id, 10, 15))
        .unwrap();
    marketplace
        .update_booking_status(&Actor::host(HOST), booking.id, BookingStatus::Confirmed)
        .unwrap();

    assert!(!marketplace.is_available(property.id, day(12), day(20)).unwrap());
    assert!(!marketplace.is_available(property.id, day(5), day(11)).unwrap());
    assert!(!marketplace.is_available(property.id, day(11), day(12)).unwrap());
    assert!(marketplace.is_available(property.id, day(15), day(20)).unwrap());
    assert!(marketplace.is_available(property.id, day(5), day(10)).unwrap());

    marketplace
        .update_booking_status(&Actor::guest(GUEST), booking.id, BookingStatus::Cancelled)
        .unwrap();
    assert!(marketplace.is_available(property.id, day(1), day(31)).unwrap());
}

#[test]
fn availability_validates_range_and_property() {
    let (marketplace, property) = setup();
    assert_eq!(
        marketplace.is_available(property.id, day(15), day(15)),
        Err(MarketplaceError::InvalidRange)
    );
    assert_eq!(
        marketplace.is_available(PropertyId(99), day(10), day(15)),
        Err(MarketplaceError::PropertyNotFound)
    );

    marketplace
        .deactivate_property(&Actor::host(HOST), property.id)
        .unwrap();
    assert_eq!(
        marketplace.is_available(property.id, day(10), day(15)),
        Err(MarketplaceError::PropertyNotFound)
    );
}

// === Bookings ===

#[test]
fn booking_price_is_computed_server_side() {
    let (marketplace, property) = setup();
    let short = marketplace
        .create_booking(&Actor::guest(GUEST), request(property.id, 1, 6))
        .unwrap();
    let long = marketplace
        .create_booking(&Actor::guest(GUEST), request(property.id, 10, 20))
        .unwrap();

    assert_eq!(short.total_price, dec!(5500));
    assert_eq!(long.total_price, dec!(10340));
    assert_eq!(long.host_id, UserId(HOST));

    let quote = marketplace.quote(property.id, day(10), day(20)).unwrap();
    assert_eq!(quote.nights, 10);
    assert_eq!(quote.subtotal, dec!(9400));
    assert_eq!(quote.tax, dec!(940));
    assert_eq!(quote.total, long.total_price);
}

#[test]
fn oversized_rates_are_rejected() {
    let marketplace = Marketplace::new();
    let host = Actor::host(HOST);

    let mut huge = draft("Palace");
    huge.rates = Rates::new(Decimal::MAX, dec!(1), dec!(10));
    assert!(matches!(
        marketplace.list_property(&host, huge),
        Err(MarketplaceError::InvalidInput(_))
    ));

    let property = marketplace.list_property(&host, draft("Flat")).unwrap();
    let update = PropertyUpdate {
        weekly_rate: Some(Decimal::MAX),
        ..Default::default()
    };
    assert!(matches!(
        marketplace.update_property(&host, property.id, update),
        Err(MarketplaceError::InvalidInput(_))
    ));
    // The stored listing still quotes normally.
    assert_eq!(
        marketplace.quote(property.id, day(1), day(6)).unwrap().total,
        dec!(5500)
    );
}

#[test]
fn huge_page_numbers_return_empty_pages() {
    let (marketplace, property) = setup();
    let query = stayfinder::PropertyQuery {
        page: Some(usize::MAX),
        limit: Some(10),
        ..Default::default()
    };
    let page = marketplace.search_properties(&query);
    assert_eq!(page.total, 1);
    assert!(page.properties.is_empty());

    let reviews = marketplace
        .property_reviews(property.id, Some(usize::MAX), Some(usize::MAX))
        .unwrap();
    assert_eq!(reviews.total, 0);
    assert!(reviews.reviews.is_empty());
}

#[test]
fn overlapping_booking_conflicts() {
    let (marketplace, property) = setup();
    marketplace
        .create_booking(&Actor::guest(GUEST), request(property.id, 10, 15))
        .unwrap();

    let err = marketplace
        .create_booking(&Actor::guest(3), request(property.id, 14, 16))
        .unwrap_err();
    assert_eq!(err, MarketplaceError::DatesUnavailable);
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[test]
fn booking_validation_errors() {
    let (marketplace, property) = setup();
    let guest = Actor::guest(GUEST);

    assert_eq!(
        marketplace.create_booking(&guest, request(property.id, 15, 10)),
        Err(MarketplaceError::InvalidRange)
    );

    let mut no_guests = request(property.id, 10, 15);
    no_guests.guests = 0;
    assert_eq!(
        marketplace.create_booking(&guest, no_guests).unwrap_err().kind(),
        ErrorKind::InvalidInput
    );

    let mut bad_email = request(property.id, 10, 15);
    bad_email.guest_details.email = "not-an-email".to_string();
    assert_eq!(
        marketplace.create_booking(&guest, bad_email).unwrap_err().kind(),
        ErrorKind::InvalidInput
    );

    assert_eq!(
        marketplace.create_booking(&guest, request(PropertyId(42), 10, 15)),
        Err(MarketplaceError::PropertyNotFound)
    );
}

#[test]
fn status_transitions_respect_roles() {
    let (marketplace, property) = setup();
    let guest = Actor::guest(GUEST);
    let host = Actor::host(HOST);
    let booking = marketplace
        .create_booking(&guest, request(property.id, 10, 15))
        .unwrap();

    assert_eq!(
        marketplace.update_booking_status(&guest, booking.id, BookingStatus::Confirmed),
        Err(MarketplaceError::ConfirmationRequiresHost)
    );
    assert_eq!(
        marketplace.update_booking_status(&Actor::host(77), booking.id, BookingStatus::Cancelled),
        Err(MarketplaceError::NotBookingParty)
    );
    assert_eq!(
        marketplace.update_booking_status(&host, booking.id, BookingStatus::Completed),
        Err(MarketplaceError::InvalidTransition {
            from: BookingStatus::Pending,
            to: BookingStatus::Completed,
        })
    );

    let confirmed = marketplace
        .update_booking_status(&host, booking.id, BookingStatus::Confirmed)
        .unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);

    let cancelled = marketplace
        .update_booking_status(&guest, booking.id, BookingStatus::Cancelled)
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    let err = marketplace
        .update_booking_status(&host, booking.id, BookingStatus::Confirmed)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);

    assert_eq!(
        marketplace.update_booking_status(&host, BookingId(999), BookingStatus::Cancelled),
        Err(MarketplaceError::BookingNotFound)
    );
}

#[test]
fn booking_visibility() {
    let (marketplace, property) = setup();
    let guest = Actor::guest(GUEST);
    let booking = marketplace
        .create_booking(&guest, request(property.id, 10, 15))
        .unwrap();

    assert!(marketplace.booking(&guest, booking.id).is_ok());
    assert!(marketplace.booking(&Actor::host(HOST), booking.id).is_ok());
    assert_eq!(
        marketplace.booking(&Actor::guest(9), booking.id),
        Err(MarketplaceError::NotBookingParty)
    );

    assert_eq!(marketplace.guest_bookings(&guest).len(), 1);
    assert!(marketplace.guest_bookings(&Actor::guest(9)).is_empty());
    assert_eq!(marketplace.host_bookings(&Actor::host(HOST)).unwrap().len(), 1);
    assert_eq!(
        marketplace.host_bookings(&guest),
        Err(MarketplaceError::HostRoleRequired)
    );
}

// === Completion sweep ===

#[test]
fn sweep_is_idempotent() {
    let (marketplace, property) = setup();
    let host = Actor::host(HOST);
    let guest = Actor::guest(GUEST);
    let past = marketplace
        .create_booking(&guest, request(property.id, 1, 5))
        .unwrap();
    let ongoing = marketplace
        .create_booking(&guest, request(property.id, 8, 12))
        .unwrap();
    for id in [past.id, ongoing.id] {
        marketplace
            .update_booking_status(&host, id, BookingStatus::Confirmed)
            .unwrap();
    }

    let first = marketplace.sweep_completions(day(10));
    let snapshot = marketplace.guest_bookings(&guest);
    let second = marketplace.sweep_completions(day(10));

    assert_eq!(first.len(), 1);
    assert_eq!(first[0].id, past.id);
    assert!(second.is_empty());
    assert_eq!(marketplace.guest_bookings(&guest), snapshot);
    assert_eq!(
        marketplace.booking(&guest, ongoing.id).unwrap().status,
        BookingStatus::Confirmed
    );

    // Completed stays free their dates.
    assert!(marketplace.is_available(property.id, day(1), day(5)).unwrap());
}

// === Reviews ===

#[test]
fn review_requires_completed_booking() {
    let (marketplace, property) = setup();
    let guest = Actor::guest(GUEST);
    let booking = marketplace
        .create_booking(&guest, request(property.id, 10, 15))
        .unwrap();

    let err = marketplace
        .submit_review(&guest, review(&property, booking.id, 5))
        .unwrap_err();
    assert_eq!(err, MarketplaceError::BookingNotCompleted);
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let eligibility = marketplace.can_review(&guest, property.id).unwrap();
    assert!(!eligibility.eligible);
    assert_eq!(eligibility.booking_id, None);
}

#[test]
fn second_review_conflicts_and_rating_reflects_one() {
    let (marketplace, property) = setup();
    let guest = Actor::guest(GUEST);
    let booking = completed_stay(&marketplace, &property, 10, 15);

    let eligibility = marketplace.can_review(&guest, property.id).unwrap();
    assert!(eligibility.eligible);
    assert_eq!(eligibility.booking_id, Some(booking.id));

    let review_record = marketplace
        .submit_review(&guest, review(&property, booking.id, 4))
        .unwrap();
    assert!(review_record.verified);
    assert_eq!(review_record.host_id, UserId(HOST));

    let err = marketplace
        .submit_review(&guest, review(&property, booking.id, 1))
        .unwrap_err();
    assert_eq!(err, MarketplaceError::AlreadyReviewed);

    let stored = marketplace.property(property.id).unwrap();
    assert_eq!(stored.rating, dec!(4));
    assert_eq!(stored.review_count, 1);
    assert_eq!(marketplace.review_stats(property.id).unwrap().total_reviews, 1);
    assert!(!marketplace.can_review(&guest, property.id).unwrap().eligible);
}

#[test]
fn rating_is_mean_of_reviews() {
    let (marketplace, property) = setup();
    let guest = Actor::guest(GUEST);
    let first = completed_stay(&marketplace, &property, 1, 3);
    let second = completed_stay(&marketplace, &property, 3, 5);
    let third = completed_stay(&marketplace, &property, 5, 7);

    // Earliest unreviewed booking first.
    assert_eq!(
        marketplace.can_review(&guest, property.id).unwrap().booking_id,
        Some(first.id)
    );

    for (booking, rating) in [(&first, 5), (&second, 4), (&third, 5)] {
        marketplace
            .submit_review(&guest, review(&property, booking.id, rating))
            .unwrap();
    }

    let stored = marketplace.property(property.id).unwrap();
    assert_eq!(stored.rating, dec!(4.67));
    assert_eq!(stored.review_count, 3);

    let stats = marketplace.review_stats(property.id).unwrap();
    assert_eq!(stats.average_rating, dec!(4.67));
    assert_eq!(stats.rating_distribution[&5], 2);
    assert_eq!(stats.rating_distribution[&4], 1);
    assert_eq!(stats.category_averages.cleanliness, Decimal::ZERO);

    let page = marketplace
        .property_reviews(property.id, Some(1), Some(2))
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.reviews.len(), 2);
    assert_eq!(page.reviews[0].booking_id, third.id);
}

#[test]
fn review_from_other_guest_is_forbidden() {
    let (marketplace, property) = setup();
    let booking = completed_stay(&marketplace, &property, 10, 15);

    let err = marketplace
        .submit_review(&Actor::guest(50), review(&property, booking.id, 5))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[test]
fn review_for_wrong_property_is_invalid() {
    let (marketplace, property) = setup();
    let other = marketplace
        .list_property(&Actor::host(HOST), draft("Hill Cabin"))
        .unwrap();
    let booking = completed_stay(&marketplace, &property, 10, 15);

    let err = marketplace
        .submit_review(&Actor::guest(GUEST), review(&other, booking.id, 5))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

// === Favorites ===

#[test]
fn favorites_add_remove_and_list() {
    let (marketplace, property) = setup();
    let host = Actor::host(HOST);
    let guest = Actor::guest(GUEST);
    let other = marketplace.list_property(&host, draft("Hill Cabin")).unwrap();

    marketplace.add_favorite(&guest, property.id).unwrap();
    marketplace.add_favorite(&guest, other.id).unwrap();
    assert_eq!(
        marketplace.add_favorite(&guest, property.id),
        Err(MarketplaceError::AlreadyFavorited)
    );
    assert_eq!(
        marketplace.add_favorite(&guest, PropertyId(99)),
        Err(MarketplaceError::PropertyNotFound)
    );

    let ids: Vec<_> = marketplace.favorites(&guest).into_iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![property.id, other.id]);

    // Deactivated listings silently drop out of the list.
    marketplace.deactivate_property(&host, other.id).unwrap();
    assert_eq!(marketplace.favorites(&guest).len(), 1);

    marketplace.remove_favorite(&guest, property.id).unwrap();
    assert_eq!(
        marketplace.remove_favorite(&guest, property.id),
        Err(MarketplaceError::FavoriteNotFound)
    );
    assert!(marketplace.favorites(&guest).is_empty());
}

// === Listings ===

#[test]
fn listing_management() {
    let (marketplace, property) = setup();
    let host = Actor::host(HOST);

    assert_eq!(
        marketplace.list_property(&Actor::guest(GUEST), draft("Nope")),
        Err(MarketplaceError::HostRoleRequired)
    );

    let update = PropertyUpdate {
        base_rate: Some(dec!(1200)),
        ..Default::default()
    };
    let updated = marketplace
        .update_property(&host, property.id, update.clone())
        .unwrap();
    assert_eq!(updated.rates.base_rate, dec!(1200));
    assert_eq!(
        marketplace.update_property(&Actor::host(5), property.id, update),
        Err(MarketplaceError::NotPropertyHost)
    );

    marketplace.deactivate_property(&host, property.id).unwrap();
    assert_eq!(
        marketplace.search_properties(&Default::default()).total,
        0
    );
    assert_eq!(marketplace.host_properties(&host).unwrap().len(), 1);
    assert_eq!(
        marketplace.host_properties(&Actor::guest(GUEST)),
        Err(MarketplaceError::HostRoleRequired)
    );
}

#[test]
fn existing_bookings_survive_deactivation() {
    let (marketplace, property) = setup();
    let booking = marketplace
        .create_booking(&Actor::guest(GUEST), request(property.id, 10, 15))
        .unwrap();
    marketplace
        .deactivate_property(&Actor::host(HOST), property.id)
        .unwrap();

    assert!(marketplace.booking(&Actor::guest(GUEST), booking.id).is_ok());
    assert_eq!(
        marketplace.create_booking(&Actor::guest(GUEST), request(property.id, 20, 22)),
        Err(MarketplaceError::PropertyNotFound)
    );
}

// === Notifications ===

#[test]
fn lifecycle_emits_notifications_in_order() {
    let (marketplace, property) = setup();
    let booking = completed_stay(&marketplace, &property, 10, 15);
    marketplace
        .submit_review(&Actor::guest(GUEST), review(&property, booking.id, 5))
        .unwrap();

    let notifications = marketplace.drain_notifications();
    let kinds: Vec<_> = notifications.iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NotificationKind::BookingRequest,
            NotificationKind::BookingConfirmed,
            NotificationKind::BookingCompleted,
            NotificationKind::ReviewReceived,
        ]
    );
    let recipients: Vec<_> = notifications.iter().map(|n| n.recipient.0).collect();
    assert_eq!(recipients, vec![HOST, GUEST, GUEST, HOST]);
    assert_eq!(marketplace.pending_notifications(), 0);
}
