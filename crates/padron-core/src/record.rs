// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Household records and dataset normalization.
//!
//! The bundled dataset is loosely typed: ids may be numbers, coordinates may be
//! strings, optional fields may be missing or `null`. Everything is coerced into
//! [`HouseholdRecord`] exactly once, and records without usable coordinates are
//! dropped instead of failing the whole load.

use std::sync::Arc;

use log::{debug, info};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::fuzzy::Searchable;

/// Promoter name used for records without an assigned promoter.
pub const UNASSIGNED_PROMOTER: &str = "Sin asignar";

/// Map center used when there is nothing to center on (Lima, Peru).
pub const DEFAULT_CENTER: (f64, f64) = (-12.0464, -77.0428);

const BUNDLED_DATASET: &str = include_str!("../assets/households.json");

/// Errors that can occur while loading a dataset document.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("invalid dataset JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("dataset must be a JSON array of household objects")]
    NotAnArray,
}

/// One household entry with location and contact metadata.
///
/// Text fields are always present (possibly empty) so rendering and search
/// never need to deal with missing values.
#[derive(Debug, Clone, PartialEq)]
pub struct HouseholdRecord {
    pub id: String,
    pub promoter: String,
    pub head_name: String,
    pub phone: String,
    pub dni: String,
    pub lat: f64,
    pub lng: f64,
    pub photo: String,
    pub notes: String,
    pub address: String,
    pub sector: String,
}

impl HouseholdRecord {
    /// Link to an external map search for this record's raw coordinates.
    #[must_use]
    pub fn map_search_url(&self) -> String {
        format!(
            "https://www.google.com/maps/search/?api=1&query={},{}",
            self.lat, self.lng
        )
    }

    /// `tel:` URI for the phone number, if there is one.
    #[must_use]
    pub fn phone_link(&self) -> Option<String> {
        if self.phone.is_empty() {
            return None;
        }
        let digits: String = self.phone.chars().filter(|c| !c.is_whitespace()).collect();
        Some(format!("tel:{digits}"))
    }

    /// Text used when the head-of-household name is missing.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.head_name.is_empty() {
            "(sin nombre)"
        } else {
            &self.head_name
        }
    }

    fn from_object(obj: &Map<String, Value>) -> Option<Self> {
        let lat = coerce_coordinate(obj.get("lat"))?;
        let lng = coerce_coordinate(obj.get("lng"))?;

        let promoter = coerce_text(obj.get("promoter"));
        let promoter = if promoter.is_empty() {
            UNASSIGNED_PROMOTER.to_string()
        } else {
            promoter
        };

        Some(Self {
            id: coerce_text(obj.get("id")),
            promoter,
            head_name: coerce_text(obj.get("headName")),
            phone: coerce_text(obj.get("phone")),
            dni: coerce_text(obj.get("dni")),
            lat,
            lng,
            photo: coerce_text(obj.get("photo")),
            notes: coerce_text(obj.get("notes")),
            address: coerce_text(obj.get("address")),
            sector: coerce_text(obj.get("sector")),
        })
    }
}

/// Stringify a loosely typed field. Missing, null and structured values become "".
fn coerce_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Numeric coercion for coordinates. Returns `None` unless the result is finite.
fn coerce_coordinate(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    parsed.is_finite().then_some(parsed)
}

/// Coerce raw JSON values into household records, dropping anything unusable.
#[must_use]
pub fn normalize(raw: &[Value]) -> Vec<HouseholdRecord> {
    let records: Vec<HouseholdRecord> = raw
        .iter()
        .filter_map(|value| {
            let record = value.as_object().and_then(HouseholdRecord::from_object);
            if record.is_none() {
                debug!("Dropping malformed household record: {value}");
            }
            record
        })
        .collect();

    if records.len() < raw.len() {
        info!(
            "Normalized {} of {} household records ({} dropped)",
            records.len(),
            raw.len(),
            raw.len() - records.len()
        );
    }
    records
}

impl Searchable for HouseholdRecord {
    fn search_text(&self, key: &str) -> &str {
        match key {
            "headName" => &self.head_name,
            "address" => &self.address,
            "dni" => &self.dni,
            "phone" => &self.phone,
            "promoter" => &self.promoter,
            "sector" => &self.sector,
            _ => "",
        }
    }
}

/// Normalized, read-only record set shared across views.
///
/// Cloning is cheap; clones share the same allocation, and
/// [`Dataset::same_as`] compares that identity.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Arc<[HouseholdRecord]>,
}

impl Dataset {
    /// Parse and normalize a JSON document holding an array of records.
    pub fn from_json_str(json: &str) -> Result<Self, DatasetError> {
        let value: Value = serde_json::from_str(json)?;
        let Value::Array(items) = value else {
            return Err(DatasetError::NotAnArray);
        };
        Ok(Self::from_records(normalize(&items)))
    }

    /// The dataset compiled into the binary.
    pub fn bundled() -> Result<Self, DatasetError> {
        Self::from_json_str(BUNDLED_DATASET)
    }

    #[must_use]
    pub fn from_records(records: Vec<HouseholdRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    #[must_use]
    pub fn records(&self) -> &[HouseholdRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when both handles point at the same normalized allocation.
    #[must_use]
    pub fn same_as(&self, other: &Dataset) -> bool {
        Arc::ptr_eq(&self.records, &other.records)
    }

    /// Mean coordinate of all records, or [`DEFAULT_CENTER`] when empty.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        center_of(self.records.iter())
    }
}

/// Mean coordinate of the given records, or [`DEFAULT_CENTER`] when there are none.
pub fn center_of<'a, I>(records: I) -> (f64, f64)
where
    I: IntoIterator<Item = &'a HouseholdRecord>,
{
    let (count, lat_sum, lng_sum) = records
        .into_iter()
        .fold((0_u32, 0.0, 0.0), |(n, lat, lng), r| (n + 1, lat + r.lat, lng + r.lng));

    if count == 0 {
        DEFAULT_CENTER
    } else {
        (lat_sum / f64::from(count), lng_sum / f64::from(count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_drops_bad_coordinates() {
        let raw = vec![
            json!({"id": "1", "lat": "not-a-number", "lng": -77.0}),
            json!({"id": "2", "lng": -77.0}),
            json!({"id": "3", "lat": null, "lng": -77.0}),
            json!({"id": "4", "lat": "", "lng": -77.0}),
            json!({"id": "5", "lat": -12.1, "lng": "-77.05"}),
        ];
        let records = normalize(&raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "5");
        assert!((records[0].lng - (-77.05)).abs() < 1e-9);
    }

    #[test]
    fn test_text_fields_default_to_empty() {
        let raw = vec![json!({"id": 42, "lat": 1.0, "lng": 2.0, "phone": null, "notes": ["x"]})];
        let records = normalize(&raw);
        let r = &records[0];
        assert_eq!(r.id, "42");
        assert_eq!(r.promoter, UNASSIGNED_PROMOTER);
        assert_eq!(r.head_name, "");
        assert_eq!(r.phone, "");
        assert_eq!(r.notes, "");
        assert_eq!(r.photo, "");
    }

    #[test]
    fn test_promoter_trimmed_and_defaulted() {
        let raw = vec![
            json!({"promoter": "  Ana ", "lat": 1.0, "lng": 2.0}),
            json!({"promoter": "   ", "lat": 1.0, "lng": 2.0}),
        ];
        let records = normalize(&raw);
        assert_eq!(records[0].promoter, "Ana");
        assert_eq!(records[1].promoter, UNASSIGNED_PROMOTER);
    }

    #[test]
    fn test_non_objects_are_skipped() {
        let raw = vec![json!(3), json!("x"), json!({"lat": 0.0, "lng": 0.0})];
        assert_eq!(normalize(&raw).len(), 1);
    }

    #[test]
    fn test_top_level_must_be_array() {
        assert!(matches!(
            Dataset::from_json_str(r#"{"lat": 1}"#),
            Err(DatasetError::NotAnArray)
        ));
        assert!(matches!(Dataset::from_json_str("[1,"), Err(DatasetError::Json(_))));
    }

    #[test]
    fn test_bundled_dataset_loads() {
        let dataset = Dataset::bundled().unwrap();
        assert!(!dataset.is_empty());
        assert!(dataset.records().iter().all(|r| r.lat.is_finite() && r.lng.is_finite()));
    }

    #[test]
    fn test_center_falls_back_to_default() {
        let dataset = Dataset::from_records(Vec::new());
        assert_eq!(dataset.center(), DEFAULT_CENTER);
    }

    #[test]
    fn test_links() {
        let record = &normalize(&[json!({"lat": -12.5, "lng": -76.25, "phone": "987 654 321"})])[0];
        assert_eq!(
            record.map_search_url(),
            "https://www.google.com/maps/search/?api=1&query=-12.5,-76.25"
        );
        assert_eq!(record.phone_link().as_deref(), Some("tel:987654321"));
    }

    #[test]
    fn test_same_as_tracks_identity() {
        let a = Dataset::from_records(Vec::new());
        let b = a.clone();
        let c = Dataset::from_records(Vec::new());
        assert!(a.same_as(&b));
        assert!(!a.same_as(&c));
    }
}
