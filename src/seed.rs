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

//! Bulk listing import from CSV.

use crate::base::{Actor, UserId};
use crate::marketplace::Marketplace;
use crate::pricing::Rates;
use crate::property::{Coordinates, NewProperty};
use csv::{ReaderBuilder, Trim};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;
use tracing::{debug, info};

/// Separator for list-valued columns (`amenities`, `images`).
const LIST_SEPARATOR: char = ';';

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Raw CSV record matching the input format.
#[derive(Debug, Deserialize)]
struct ListingRecord {
    host: Option<u64>,
    title: String,
    description: String,
    location: String,
    lat: f64,
    lng: f64,
    base_rate: Decimal,
    weekly_rate: Decimal,
    tax_percent: Decimal,
    amenities: String,
    cover_photo: String,
    #[serde(default)]
    images: String,
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

impl ListingRecord {
    fn into_listing(self, default_host: UserId) -> (Actor, NewProperty) {
        let host = Actor::host(self.host.unwrap_or(default_host.0));
        let draft = NewProperty {
            title: self.title,
            description: self.description,
            location: self.location,
            coordinates: Coordinates {
                lat: self.lat,
                lng: self.lng,
            },
            rates: Rates::new(self.base_rate, self.weekly_rate, self.tax_percent),
            amenities: split_list(&self.amenities),
            cover_photo: self.cover_photo,
            images: split_list(&self.images),
        };
        (host, draft)
    }
}

/// Imports listings from a CSV reader.
///
/// Rows without a `host` value are listed by `default_host`. Malformed rows
/// and rows that fail validation are skipped and counted.
///
/// # CSV Format
///
/// ```csv
/// host,title,description,location,lat,lng,base_rate,weekly_rate,tax_percent,amenities,cover_photo,images
/// 1,Sea View Flat,Two bedrooms,"Panaji, Goa",15.49,73.82,2500,2000,12,wifi;pool,/uploads/a.jpg,/uploads/b.jpg
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the header cannot be read.
pub fn import_listings<R: Read>(
    marketplace: &Marketplace,
    default_host: UserId,
    reader: R,
) -> Result<ImportSummary, csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    // Surface an unreadable header instead of skipping every row.
    rdr.headers()?;

    let mut summary = ImportSummary::default();
    for (index, result) in rdr.deserialize::<ListingRecord>().enumerate() {
        let row = index + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e),
            Err(e) => {
                debug!(row, error = %e, "skipping malformed listing row");
                summary.skipped += 1;
                continue;
            }
        };

        let (host, draft) = record.into_listing(default_host);
        match marketplace.list_property(&host, draft) {
            Ok(_) => summary.imported += 1,
            Err(e) => {
                debug!(row, error = %e, "skipping invalid listing");
                summary.skipped += 1;
            }
        }
    }

    info!(
        imported = summary.imported,
        skipped = summary.skipped,
        "listing import finished"
    );
    Ok(summary)
}
