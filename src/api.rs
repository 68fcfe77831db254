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

//! REST API.
//!
//! ## Endpoints
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET | `/properties` | Search active listings |
//! | POST | `/properties` | Create a listing (host) |
//! | GET | `/properties/my-listings` | Caller's listings (host) |
//! | GET, PUT, DELETE | `/properties/{id}` | Read, edit, deactivate a listing |
//! | POST | `/properties/{id}/availability` | Availability check |
//! | POST | `/properties/{id}/quote` | Price quote |
//! | GET, POST | `/bookings` | Caller's bookings / create a booking |
//! | GET | `/bookings/host` | Bookings on the caller's listings |
//! | GET | `/bookings/{id}` | Single booking |
//! | PUT | `/bookings/{id}/status` | Confirm or cancel |
//! | POST | `/reviews` | Review a completed stay |
//! | GET | `/reviews/property/{id}` | Paged reviews |
//! | GET | `/reviews/stats/{id}` | Rating statistics |
//! | GET | `/reviews/can-review/{id}` | Review eligibility |
//! | GET, POST | `/favorites` | List / add favorites |
//! | DELETE | `/favorites/{property_id}` | Remove a favorite |
//!
//! ## Identity
//!
//! Authentication happens upstream. The gateway forwards the caller as
//! `x-user-id` (integer) and `x-user-role` (`guest`, `host` or `admin`,
//! default `guest`). Protected routes answer 401 without a valid id.
//!
//! ## Example
//!
//! ```bash
//! curl -X POST http://localhost:5001/bookings \
//!   -H "Content-Type: application/json" -H "x-user-id: 7" \
//!   -d '{"property_id": 1, "check_in": "2024-01-10", "check_out": "2024-01-15",
//!        "guests": 2, "guest_details": {"name": "Asha", "email": "asha@example.com",
//!        "phone": "9999999999"}}'
//! ```

use crate::base::{Actor, PropertyId, Role, UserId};
use crate::booking::{Booking, BookingStatus};
use crate::error::ErrorKind;
use crate::favorites::Favorite;
use crate::marketplace::{BookingRequest, Marketplace};
use crate::pricing::Quote;
use crate::property::{NewProperty, Property, PropertyPage, PropertyQuery, PropertyUpdate};
use crate::review::{NewReview, Review, ReviewEligibility, ReviewPage, ReviewStats};
use crate::{BookingId, MarketplaceError};
use axum::{
    Json, Router,
    extract::{
        FromRequestParts, Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

// === Request/Response DTOs ===

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DateRange {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub available: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusRequest {
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FavoriteRequest {
    pub property_id: PropertyId,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Response body for errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Application State ===

/// Shared application state containing the marketplace.
#[derive(Clone)]
pub struct AppState {
    pub marketplace: Arc<Marketplace>,
}

// === Error Handling ===

/// Wrapper converting marketplace and extractor failures into HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    Marketplace(MarketplaceError),
    Unauthenticated(&'static str),
}

impl From<MarketplaceError> for ApiError {
    fn from(err: MarketplaceError) -> Self {
        ApiError::Marketplace(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        MarketplaceError::invalid(rejection.body_text()).into()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        MarketplaceError::invalid(rejection.body_text()).into()
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        MarketplaceError::invalid(rejection.body_text()).into()
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::InvalidInput | ErrorKind::InvalidRange => StatusCode::BAD_REQUEST,
        ErrorKind::InvalidTransition | ErrorKind::InvalidState => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Conflict => StatusCode::CONFLICT,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, error) = match self {
            ApiError::Marketplace(err) => (status_for(err.kind()), err.code(), err.to_string()),
            ApiError::Unauthenticated(reason) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", reason.to_string())
            }
        };
        debug!(status = status.as_u16(), code, %error, "request rejected");

        (
            status,
            Json(ErrorResponse {
                error,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// === Identity ===

/// The caller, as forwarded by the authentication gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity(pub Actor);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or(ApiError::Unauthenticated("missing user identity"))?
            .to_str()
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .ok_or(ApiError::Unauthenticated("invalid user identity"))?;

        let role = match parts.headers.get(USER_ROLE_HEADER) {
            None => Role::Guest,
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|role| role.parse::<Role>().ok())
                .ok_or(ApiError::Unauthenticated("invalid user role"))?,
        };

        Ok(Identity(Actor::new(UserId(user_id), role)))
    }
}

// === Handlers ===

/// GET / - Welcome message.
async fn welcome() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Welcome to the StayFinder API".to_string(),
    })
}

/// GET /properties - Search active listings.
async fn search_properties(
    State(state): State<AppState>,
    query: Result<Query<PropertyQuery>, QueryRejection>,
) -> ApiResult<Json<PropertyPage>> {
    let Query(query) = query?;
    Ok(Json(state.marketplace.search_properties(&query)))
}

/// POST /properties - Create a listing.
async fn create_property(
    State(state): State<AppState>,
    Identity(actor): Identity,
    body: Result<Json<NewProperty>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Property>)> {
    let Json(draft) = body?;
    let property = state.marketplace.list_property(&actor, draft)?;
    Ok((StatusCode::CREATED, Json(property)))
}

/// GET /properties/my-listings - Caller's own listings.
async fn my_listings(
    State(state): State<AppState>,
    Identity(actor): Identity,
) -> ApiResult<Json<Vec<Property>>> {
    Ok(Json(state.marketplace.host_properties(&actor)?))
}

/// GET /properties/{id}
async fn get_property(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> ApiResult<Json<Property>> {
    let Path(id) = id?;
    Ok(Json(state.marketplace.property(PropertyId(id))?))
}

/// PUT /properties/{id}
async fn update_property(
    State(state): State<AppState>,
    Identity(actor): Identity,
    id: Result<Path<u64>, PathRejection>,
    body: Result<Json<PropertyUpdate>, JsonRejection>,
) -> ApiResult<Json<Property>> {
    let Path(id) = id?;
    let Json(update) = body?;
    Ok(Json(state.marketplace.update_property(&actor, PropertyId(id), update)?))
}

/// DELETE /properties/{id} - Soft delete.
async fn delete_property(
    State(state): State<AppState>,
    Identity(actor): Identity,
    id: Result<Path<u64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    state.marketplace.deactivate_property(&actor, PropertyId(id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /properties/{id}/availability
async fn check_availability(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
    body: Result<Json<DateRange>, JsonRejection>,
) -> ApiResult<Json<AvailabilityResponse>> {
    let Path(id) = id?;
    let Json(range) = body?;
    let available = state
        .marketplace
        .is_available(PropertyId(id), range.check_in, range.check_out)?;
    Ok(Json(AvailabilityResponse { available }))
}

/// POST /properties/{id}/quote
async fn quote(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
    body: Result<Json<DateRange>, JsonRejection>,
) -> ApiResult<Json<Quote>> {
    let Path(id) = id?;
    let Json(range) = body?;
    Ok(Json(state.marketplace.quote(PropertyId(id), range.check_in, range.check_out)?))
}

/// POST /bookings
async fn create_booking(
    State(state): State<AppState>,
    Identity(actor): Identity,
    body: Result<Json<BookingRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    let Json(request) = body?;
    let booking = state.marketplace.create_booking(&actor, request)?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /bookings - Bookings made by the caller.
async fn my_bookings(
    State(state): State<AppState>,
    Identity(actor): Identity,
) -> Json<Vec<Booking>> {
    Json(state.marketplace.guest_bookings(&actor))
}

/// GET /bookings/host - Bookings on the caller's listings.
async fn host_bookings(
    State(state): State<AppState>,
    Identity(actor): Identity,
) -> ApiResult<Json<Vec<Booking>>> {
    Ok(Json(state.marketplace.host_bookings(&actor)?))
}

/// GET /bookings/{id}
async fn get_booking(
    State(state): State<AppState>,
    Identity(actor): Identity,
    id: Result<Path<u64>, PathRejection>,
) -> ApiResult<Json<Booking>> {
    let Path(id) = id?;
    Ok(Json(state.marketplace.booking(&actor, BookingId(id))?))
}

/// PUT /bookings/{id}/status
async fn update_booking_status(
    State(state): State<AppState>,
    Identity(actor): Identity,
    id: Result<Path<u64>, PathRejection>,
    body: Result<Json<StatusRequest>, JsonRejection>,
) -> ApiResult<Json<Booking>> {
    let Path(id) = id?;
    let Json(request) = body?;
    let booking = state
        .marketplace
        .update_booking_status(&actor, BookingId(id), request.status)?;
    Ok(Json(booking))
}

/// POST /reviews
async fn create_review(
    State(state): State<AppState>,
    Identity(actor): Identity,
    body: Result<Json<NewReview>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Review>)> {
    let Json(review) = body?;
    let review = state.marketplace.submit_review(&actor, review)?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// GET /reviews/property/{id}
async fn property_reviews(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<ReviewPage>> {
    let Path(id) = id?;
    let Query(query) = query?;
    let page = state
        .marketplace
        .property_reviews(PropertyId(id), query.page, query.limit)?;
    Ok(Json(page))
}

/// GET /reviews/stats/{id}
async fn review_stats(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> ApiResult<Json<ReviewStats>> {
    let Path(id) = id?;
    Ok(Json(state.marketplace.review_stats(PropertyId(id))?))
}

/// GET /reviews/can-review/{id}
async fn can_review(
    State(state): State<AppState>,
    Identity(actor): Identity,
    id: Result<Path<u64>, PathRejection>,
) -> ApiResult<Json<ReviewEligibility>> {
    let Path(id) = id?;
    Ok(Json(state.marketplace.can_review(&actor, PropertyId(id))?))
}

/// POST /favorites
async fn add_favorite(
    State(state): State<AppState>,
    Identity(actor): Identity,
    body: Result<Json<FavoriteRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Favorite>)> {
    let Json(request) = body?;
    let favorite = state.marketplace.add_favorite(&actor, request.property_id)?;
    Ok((StatusCode::CREATED, Json(favorite)))
}

/// GET /favorites
async fn list_favorites(
    State(state): State<AppState>,
    Identity(actor): Identity,
) -> Json<Vec<Property>> {
    Json(state.marketplace.favorites(&actor))
}

/// DELETE /favorites/{property_id}
async fn remove_favorite(
    State(state): State<AppState>,
    Identity(actor): Identity,
    property_id: Result<Path<u64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(property_id) = property_id?;
    state
        .marketplace
        .remove_favorite(&actor, PropertyId(property_id))?;
    Ok(StatusCode::NO_CONTENT)
}

// === Router ===

pub fn router(marketplace: Arc<Marketplace>) -> Router {
    let state = AppState { marketplace };
    Router::new()
        .route("/", get(welcome))
        .route("/properties", get(search_properties).post(create_property))
        .route("/properties/my-listings", get(my_listings))
        .route(
            "/properties/{id}",
            get(get_property).put(update_property).delete(delete_property),
        )
        .route("/properties/{id}/availability", post(check_availability))
        .route("/properties/{id}/quote", post(quote))
        .route("/bookings", get(my_bookings).post(create_booking))
        .route("/bookings/host", get(host_bookings))
        .route("/bookings/{id}", get(get_booking))
        .route("/bookings/{id}/status", put(update_booking_status))
        .route("/reviews", post(create_review))
        .route("/reviews/property/{id}", get(property_reviews))
        .route("/reviews/stats/{id}", get(review_stats))
        .route("/reviews/can-review/{id}", get(can_review))
        .route("/favorites", get(list_favorites).post(add_favorite))
        .route("/favorites/{property_id}", delete(remove_favorite))
        .with_state(state)
}
