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

//! Property listings.

use crate::base::{Actor, PropertyId, Sequence, UserId};
use crate::pricing::Rates;
use crate::MarketplaceError;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default and maximum page sizes for listing searches.
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    fn validate(&self) -> Result<(), MarketplaceError> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(MarketplaceError::invalid("coordinates must be finite numbers"));
        }
        Ok(())
    }
}

/// A listing owned by a host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub id: PropertyId,
    pub host_id: UserId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub coordinates: Coordinates,
    #[serde(flatten)]
    pub rates: Rates,
    pub amenities: Vec<String>,
    pub cover_photo: String,
    pub images: Vec<String>,
    /// Mean review rating, maintained by the review ledger.
    pub rating: Decimal,
    pub review_count: u32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by a host when creating a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProperty {
    pub title: String,
    pub description: String,
    pub location: String,
    pub coordinates: Coordinates,
    #[serde(flatten)]
    pub rates: Rates,
    pub amenities: Vec<String>,
    pub cover_photo: String,
    #[serde(default)]
    pub images: Vec<String>,
}

impl NewProperty {
    pub(crate) fn validate(&self) -> Result<(), MarketplaceError> {
        require_text("title", &self.title)?;
        require_text("description", &self.description)?;
        require_text("location", &self.location)?;
        require_text("cover photo", &self.cover_photo)?;
        self.coordinates.validate()?;
        self.rates.validate()?;
        validate_amenities(&self.amenities)
    }
}

/// Partial update of a listing. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub base_rate: Option<Decimal>,
    pub weekly_rate: Option<Decimal>,
    pub tax_percent: Option<Decimal>,
    pub amenities: Option<Vec<String>>,
    pub cover_photo: Option<String>,
    pub images: Option<Vec<String>>,
}

impl PropertyUpdate {
    /// Produces the updated listing without touching `property`, so a
    /// failed validation leaves the stored record intact.
    fn apply(self, property: &Property) -> Result<Property, MarketplaceError> {
        let mut updated = property.clone();
        if let Some(title) = self.title {
            require_text("title", &title)?;
            updated.title = title;
        }
        if let Some(description) = self.description {
            require_text("description", &description)?;
            updated.description = description;
        }
        if let Some(location) = self.location {
            require_text("location", &location)?;
            updated.location = location;
        }
        if let Some(coordinates) = self.coordinates {
            coordinates.validate()?;
            updated.coordinates = coordinates;
        }
        if let Some(cover_photo) = self.cover_photo {
            require_text("cover photo", &cover_photo)?;
            updated.cover_photo = cover_photo;
        }
        if let Some(amenities) = self.amenities {
            validate_amenities(&amenities)?;
            updated.amenities = amenities;
        }
        if let Some(images) = self.images {
            updated.images = images;
        }
        updated.rates = Rates {
            base_rate: self.base_rate.unwrap_or(updated.rates.base_rate),
            weekly_rate: self.weekly_rate.unwrap_or(updated.rates.weekly_rate),
            tax_percent: self.tax_percent.unwrap_or(updated.rates.tax_percent),
        };
        updated.rates.validate()?;
        Ok(updated)
    }
}

fn require_text(field: &str, value: &str) -> Result<(), MarketplaceError> {
    if value.trim().is_empty() {
        return Err(MarketplaceError::invalid(format!("{field} is required")));
    }
    Ok(())
}

fn validate_amenities(amenities: &[String]) -> Result<(), MarketplaceError> {
    if amenities.iter().all(|amenity| amenity.trim().is_empty()) {
        return Err(MarketplaceError::invalid("at least one amenity is required"));
    }
    Ok(())
}

/// Search filters for active listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyQuery {
    /// Lower bound on the base nightly rate.
    pub min_price: Option<Decimal>,
    /// Upper bound on the base nightly rate.
    pub max_price: Option<Decimal>,
    /// Case-insensitive substring of the location.
    pub city: Option<String>,
    /// 1-based page number.
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl PropertyQuery {
    fn matches(&self, property: &Property) -> bool {
        if !property.active {
            return false;
        }
        if self.min_price.is_some_and(|min| property.rates.base_rate < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| property.rates.base_rate > max) {
            return false;
        }
        match &self.city {
            Some(city) if !city.trim().is_empty() => property
                .location
                .to_lowercase()
                .contains(&city.trim().to_lowercase()),
            _ => true,
        }
    }
}

/// Resolved pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: usize,
    pub size: usize,
}

impl Page {
    pub fn new(page: Option<usize>, limit: Option<usize>) -> Self {
        Self {
            number: page.unwrap_or(1).max(1),
            size: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Items to skip. Saturates, so far-out pages are simply empty.
    pub fn offset(&self) -> usize {
        (self.number - 1).saturating_mul(self.size)
    }

    pub fn total_pages(&self, total: usize) -> usize {
        total.div_ceil(self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyPage {
    pub properties: Vec<Property>,
    pub total: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

/// All listings, indexed by id.
#[derive(Debug, Default)]
pub struct PropertyDirectory {
    properties: DashMap<PropertyId, Property>,
    ids: Sequence,
}

impl PropertyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// - [`MarketplaceError::HostRoleRequired`] - Caller is a guest.
    /// - [`MarketplaceError::InvalidInput`] - A required field is missing or invalid.
    pub fn create(&self, actor: &Actor, draft: NewProperty) -> Result<Property, MarketplaceError> {
        if !actor.can_host() {
            return Err(MarketplaceError::HostRoleRequired);
        }
        draft.validate()?;

        let property = Property {
            id: PropertyId(self.ids.next()),
            host_id: actor.user_id,
            title: draft.title.trim().to_string(),
            description: draft.description,
            location: draft.location.trim().to_string(),
            coordinates: draft.coordinates,
            rates: draft.rates,
            amenities: draft.amenities,
            cover_photo: draft.cover_photo,
            images: draft.images,
            rating: Decimal::ZERO,
            review_count: 0,
            active: true,
            created_at: Utc::now(),
        };
        self.properties.insert(property.id, property.clone());
        Ok(property)
    }

    /// Any listing, active or not.
    pub fn get(&self, id: PropertyId) -> Result<Property, MarketplaceError> {
        self.properties
            .get(&id)
            .map(|property| property.clone())
            .ok_or(MarketplaceError::PropertyNotFound)
    }

    /// A listing that can still be booked or favorited.
    pub fn active(&self, id: PropertyId) -> Result<Property, MarketplaceError> {
        self.properties
            .get(&id)
            .filter(|property| property.active)
            .map(|property| property.clone())
            .ok_or(MarketplaceError::PropertyNotFound)
    }

    /// # Errors
    ///
    /// - [`MarketplaceError::PropertyNotFound`] - Unknown listing.
    /// - [`MarketplaceError::NotPropertyHost`] - Caller does not own the listing.
    /// - [`MarketplaceError::InvalidInput`] - An updated field is invalid.
    pub fn update(
        &self,
        actor: &Actor,
        id: PropertyId,
        update: PropertyUpdate,
    ) -> Result<Property, MarketplaceError> {
        let mut property = self
            .properties
            .get_mut(&id)
            .ok_or(MarketplaceError::PropertyNotFound)?;
        if property.host_id != actor.user_id {
            return Err(MarketplaceError::NotPropertyHost);
        }
        let updated = update.apply(&property)?;
        *property = updated.clone();
        Ok(updated)
    }

    /// Soft-deletes a listing. Existing bookings are kept.
    pub fn deactivate(&self, actor: &Actor, id: PropertyId) -> Result<Property, MarketplaceError> {
        let mut property = self
            .properties
            .get_mut(&id)
            .ok_or(MarketplaceError::PropertyNotFound)?;
        if property.host_id != actor.user_id {
            return Err(MarketplaceError::NotPropertyHost);
        }
        property.active = false;
        Ok(property.clone())
    }

    /// Active listings matching `query`, newest first.
    pub fn search(&self, query: &PropertyQuery) -> PropertyPage {
        let mut matching: Vec<Property> = self
            .properties
            .iter()
            .filter(|entry| query.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        matching.sort_by(|a, b| b.id.cmp(&a.id));

        let page = Page::new(query.page, query.limit);
        let total = matching.len();
        let properties = matching
            .into_iter()
            .skip(page.offset())
            .take(page.size)
            .collect();

        PropertyPage {
            properties,
            total,
            total_pages: page.total_pages(total),
            current_page: page.number,
        }
    }

    /// Every listing owned by `host`, including deactivated ones, newest first.
    pub fn hosted_by(&self, host: UserId) -> Vec<Property> {
        let mut properties: Vec<Property> = self
            .properties
            .iter()
            .filter(|entry| entry.host_id == host)
            .map(|entry| entry.value().clone())
            .collect();
        properties.sort_by(|a, b| b.id.cmp(&a.id));
        properties
    }

    /// Writes the aggregate rating. Only the review ledger calls this.
    pub(crate) fn set_rating(&self, id: PropertyId, rating: Decimal, review_count: u32) {
        if let Some(mut property) = self.properties.get_mut(&id) {
            property.rating = rating;
            property.review_count = review_count;
        }
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    pub(crate) fn draft(title: &str, location: &str, base_rate: Decimal) -> NewProperty {
        NewProperty {
            title: title.to_string(),
            description: "Sea-facing two bedroom flat".to_string(),
            location: location.to_string(),
            coordinates: Coordinates {
                lat: 15.49,
                lng: 73.82,
            },
            rates: Rates::new(base_rate, base_rate - dec!(100), dec!(12)),
            amenities: vec!["wifi".to_string(), "pool".to_string()],
            cover_photo: "/uploads/cover.jpg".to_string(),
            images: vec![],
        }
    }

    #[test]
    fn guests_cannot_list_properties() {
        let directory = PropertyDirectory::new();
        let result = directory.create(&Actor::guest(1), draft("Flat", "Goa", dec!(1000)));
        assert_eq!(result, Err(MarketplaceError::HostRoleRequired));
        assert!(directory.is_empty());
    }

    #[test]
    fn create_validates_required_fields() {
        let directory = PropertyDirectory::new();
        let host = Actor::host(1);

        let mut missing_title = draft("", "Goa", dec!(1000));
        missing_title.title = "   ".to_string();
        assert!(matches!(
            directory.create(&host, missing_title),
            Err(MarketplaceError::InvalidInput(_))
        ));

        let mut no_amenities = draft("Flat", "Goa", dec!(1000));
        no_amenities.amenities.clear();
        assert!(directory.create(&host, no_amenities).is_err());

        let mut bad_coordinates = draft("Flat", "Goa", dec!(1000));
        bad_coordinates.coordinates.lat = f64::NAN;
        assert!(directory.create(&host, bad_coordinates).is_err());
    }

    #[test]
    fn new_listing_starts_unrated_and_active() {
        let directory = PropertyDirectory::new();
        let property = directory
            .create(&Actor::host(1), draft("Flat", "Goa", dec!(1000)))
            .unwrap();
        assert_eq!(property.host_id, UserId(1));
        assert_eq!(property.rating, Decimal::ZERO);
        assert!(property.active);
        assert_eq!(directory.get(property.id).unwrap(), property);
    }

    #[test]
    fn only_owner_can_update() {
        let directory = PropertyDirectory::new();
        let property = directory
            .create(&Actor::host(1), draft("Flat", "Goa", dec!(1000)))
            .unwrap();

        let update = PropertyUpdate {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        let result = directory.update(&Actor::host(2), property.id, update.clone());
        assert_eq!(result, Err(MarketplaceError::NotPropertyHost));

        let updated = directory.update(&Actor::host(1), property.id, update).unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.rates, property.rates);
    }

    #[test]
    fn invalid_update_leaves_listing_unchanged() {
        let directory = PropertyDirectory::new();
        let property = directory
            .create(&Actor::host(1), draft("Flat", "Goa", dec!(1000)))
            .unwrap();

        let update = PropertyUpdate {
            title: Some("Renamed".to_string()),
            base_rate: Some(dec!(-5)),
            ..Default::default()
        };
        assert!(directory.update(&Actor::host(1), property.id, update).is_err());
        assert_eq!(directory.get(property.id).unwrap().title, "Flat");
    }

    #[test]
    fn deactivated_listing_is_hidden_but_kept() {
        let directory = PropertyDirectory::new();
        let host = Actor::host(1);
        let property = directory.create(&host, draft("Flat", "Goa", dec!(1000))).unwrap();

        directory.deactivate(&host, property.id).unwrap();

        assert_eq!(directory.active(property.id), Err(MarketplaceError::PropertyNotFound));
        assert!(!directory.get(property.id).unwrap().active);
        assert_eq!(directory.search(&PropertyQuery::default()).total, 0);
        assert_eq!(directory.hosted_by(host.user_id).len(), 1);
    }

    #[test]
    fn search_filters_by_price_and_city() {
        let directory = PropertyDirectory::new();
        let host = Actor::host(1);
        directory.create(&host, draft("A", "Panaji, Goa", dec!(1000))).unwrap();
        directory.create(&host, draft("B", "Mumbai", dec!(3000))).unwrap();
        directory.create(&host, draft("C", "North Goa", dec!(5000))).unwrap();

        let query = PropertyQuery {
            city: Some("goa".to_string()),
            max_price: Some(dec!(4000)),
            ..Default::default()
        };
        let page = directory.search(&query);
        assert_eq!(page.total, 1);
        assert_eq!(page.properties[0].title, "A");

        let query = PropertyQuery {
            min_price: Some(dec!(2000)),
            ..Default::default()
        };
        let titles: Vec<_> = directory
            .search(&query)
            .properties
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["C", "B"]);
    }

    #[test]
    fn search_paginates_newest_first() {
        let directory = PropertyDirectory::new();
        let host = Actor::host(1);
        for i in 0..5 {
            directory
                .create(&host, draft(&format!("P{i}"), "Goa", dec!(1000)))
                .unwrap();
        }

        let query = PropertyQuery {
            page: Some(2),
            limit: Some(2),
            ..Default::default()
        };
        let page = directory.search(&query);
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 2);
        let titles: Vec<_> = page.properties.into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["P2", "P1"]);
    }

    #[test]
    fn page_clamps_bounds() {
        let page = Page::new(Some(0), Some(1000));
        assert_eq!(page.number, 1);
        assert_eq!(page.size, MAX_PAGE_SIZE);
        assert_eq!(Page::new(None, None).size, DEFAULT_PAGE_SIZE);
        assert_eq!(Page::new(None, Some(3)).total_pages(7), 3);
        assert_eq!(Page::new(None, Some(3)).total_pages(0), 0);
    }

    #[test]
    fn page_offset_saturates() {
        let page = Page::new(Some(usize::MAX), Some(MAX_PAGE_SIZE));
        assert_eq!(page.offset(), usize::MAX);

        let directory = PropertyDirectory::new();
        directory
            .create(&Actor::host(1), draft("Flat", "Goa", dec!(1000)))
            .unwrap();
        let query = PropertyQuery {
            page: Some(usize::MAX),
            ..Default::default()
        };
        let page = directory.search(&query);
        assert_eq!(page.total, 1);
        assert!(page.properties.is_empty());
        assert_eq!(page.current_page, usize::MAX);
    }

    #[test]
    fn set_rating_updates_cache() {
        let directory = PropertyDirectory::new();
        let property = directory
            .create(&Actor::host(1), draft("Flat", "Goa", dec!(1000)))
            .unwrap();
        directory.set_rating(property.id, dec!(4.5), 2);
        let stored = directory.get(property.id).unwrap();
        assert_eq!(stored.rating, dec!(4.5));
        assert_eq!(stored.review_count, 2);
    }
}
