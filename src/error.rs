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

//! Error types for marketplace operations.

use crate::booking::BookingStatus;
use thiserror::Error;

/// Caller-actionable classification of a [`MarketplaceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    InvalidInput,
    InvalidRange,
    InvalidTransition,
    InvalidState,
    Conflict,
}

/// Marketplace operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketplaceError {
    /// Referenced property does not exist or was deactivated
    #[error("property not found")]
    PropertyNotFound,

    /// Referenced booking does not exist
    #[error("booking not found")]
    BookingNotFound,

    /// The user has not favorited the property
    #[error("favorite not found")]
    FavoriteNotFound,

    /// Caller's role does not allow the operation
    #[error("operation requires a host account")]
    HostRoleRequired,

    /// Caller does not own the listing
    #[error("only the listing host may modify this property")]
    NotPropertyHost,

    /// Caller is neither the guest nor the host of the booking
    #[error("only the guest or host of a booking may access it")]
    NotBookingParty,

    /// Only the host may confirm a booking
    #[error("only the host may confirm a booking")]
    ConfirmationRequiresHost,

    /// Caller is not the guest who made the booking
    #[error("only the guest who stayed may review this booking")]
    NotBookingGuest,

    /// Request payload failed validation
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Check-out is not after check-in, or the stay has no nights
    #[error("check-out date must be after check-in date")]
    InvalidRange,

    /// Status change not permitted by the booking state machine
    #[error("cannot change booking status from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    /// Booking has not reached the completed state yet
    #[error("only completed bookings can be reviewed")]
    BookingNotCompleted,

    /// Another active booking overlaps the requested dates
    #[error("property is not available for these dates")]
    DatesUnavailable,

    /// The user already favorited the property
    #[error("property already in favorites")]
    AlreadyFavorited,

    /// The booking already carries a review
    #[error("booking has already been reviewed")]
    AlreadyReviewed,
}

impl MarketplaceError {
    /// Shorthand for an [`MarketplaceError::InvalidInput`] with a message.
    pub fn invalid(message: impl Into<String>) -> Self {
        MarketplaceError::InvalidInput(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PropertyNotFound | Self::BookingNotFound | Self::FavoriteNotFound => {
                ErrorKind::NotFound
            }
            Self::HostRoleRequired
            | Self::NotPropertyHost
            | Self::NotBookingParty
            | Self::ConfirmationRequiresHost
            | Self::NotBookingGuest => ErrorKind::Forbidden,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::InvalidRange => ErrorKind::InvalidRange,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::BookingNotCompleted => ErrorKind::InvalidState,
            Self::DatesUnavailable | Self::AlreadyFavorited | Self::AlreadyReviewed => {
                ErrorKind::Conflict
            }
        }
    }

    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PropertyNotFound => "PROPERTY_NOT_FOUND",
            Self::BookingNotFound => "BOOKING_NOT_FOUND",
            Self::FavoriteNotFound => "FAVORITE_NOT_FOUND",
            Self::HostRoleRequired => "HOST_ROLE_REQUIRED",
            Self::NotPropertyHost => "NOT_PROPERTY_HOST",
            Self::NotBookingParty => "NOT_BOOKING_PARTY",
            Self::ConfirmationRequiresHost => "CONFIRMATION_REQUIRES_HOST",
            Self::NotBookingGuest => "NOT_BOOKING_GUEST",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::InvalidRange => "INVALID_RANGE",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::BookingNotCompleted => "BOOKING_NOT_COMPLETED",
            Self::DatesUnavailable => "DATES_UNAVAILABLE",
            Self::AlreadyFavorited => "ALREADY_FAVORITED",
            Self::AlreadyReviewed => "ALREADY_REVIEWED",
        }
    }
}
