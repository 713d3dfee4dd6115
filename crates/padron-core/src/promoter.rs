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

//! Promoter summaries for the picker screen.

use std::collections::BTreeMap;

use crate::fuzzy::{FuzzyMatcher, Searchable, PROMOTER_THRESHOLD};
use crate::record::HouseholdRecord;

/// A promoter name with the number of households assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoterSummary {
    pub name: String,
    pub count: usize,
}

impl Searchable for PromoterSummary {
    fn search_text(&self, key: &str) -> &str {
        match key {
            "name" => &self.name,
            _ => "",
        }
    }
}

/// Distinct promoters sorted by name, with counts over all records.
///
/// `query` only filters which summaries are returned; counts are always taken
/// from the unfiltered record list.
#[must_use]
pub fn list_promoters(records: &[HouseholdRecord], query: &str) -> Vec<PromoterSummary> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.promoter.as_str()).or_default() += 1;
    }

    let summaries: Vec<PromoterSummary> = counts
        .into_iter()
        .map(|(name, count)| PromoterSummary {
            name: name.to_string(),
            count,
        })
        .collect();

    if query.trim().is_empty() {
        return summaries;
    }

    FuzzyMatcher::new(&["name"], PROMOTER_THRESHOLD)
        .search(&summaries, query)
        .into_iter()
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::normalize;
    use serde_json::json;

    fn records() -> Vec<HouseholdRecord> {
        normalize(&[
            json!({"promoter": "Luis", "lat": 0.0, "lng": 0.0}),
            json!({"promoter": "Ana", "lat": 0.0, "lng": 0.0}),
            json!({"promoter": "ana", "lat": 0.0, "lng": 0.0}),
            json!({"promoter": "Ana", "lat": 0.0, "lng": 0.0}),
        ])
    }

    #[test]
    fn test_sorted_and_case_sensitive() {
        let summaries = list_promoters(&records(), "");
        let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Luis", "ana"]);
        assert_eq!(summaries[0].count, 2);
    }

    #[test]
    fn test_counts_ignore_query() {
        let summaries = list_promoters(&records(), "Ana");
        let ana = summaries.iter().find(|s| s.name == "Ana").unwrap();
        assert_eq!(ana.count, 2);
        assert!(summaries.iter().all(|s| s.name != "Luis"));
    }
}
