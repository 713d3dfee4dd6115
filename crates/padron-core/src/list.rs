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

//! List renderer state: search, ordering and the detail overlay.

use crate::fuzzy::{FuzzyMatcher, HOUSEHOLD_THRESHOLD};
use crate::record::HouseholdRecord;

/// Keys searched by the household list.
pub const LIST_SEARCH_KEYS: [&str; 4] = ["headName", "address", "dni", "phone"];

/// Axis-aligned screen rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    #[must_use]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }
}

/// Whether a click should close an overlay whose content occupies `content`.
///
/// Only clicks that land outside the content (on the scrim) dismiss it.
#[must_use]
pub fn should_dismiss(content: Bounds, click: (f32, f32)) -> bool {
    !content.contains(click.0, click.1)
}

/// Records ordered by head-of-household name. Missing names sort first.
#[must_use]
pub fn sort_by_head_name(records: &[HouseholdRecord]) -> Vec<&HouseholdRecord> {
    let mut sorted: Vec<&HouseholdRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.head_name.cmp(&b.head_name));
    sorted
}

/// Search box contents and the record open in the detail overlay.
#[derive(Debug, Default)]
pub struct ListState {
    pub query: String,
    selected: Option<usize>,
}

impl ListState {
    /// Sorted records, fuzzy filtered when a query is present.
    #[must_use]
    pub fn visible<'a>(&self, records: &'a [HouseholdRecord]) -> Vec<&'a HouseholdRecord> {
        let sorted = sort_by_head_name(records);
        FuzzyMatcher::new(&LIST_SEARCH_KEYS, HOUSEHOLD_THRESHOLD).search(sorted, &self.query)
    }

    /// Open the overlay for `records[index]`.
    pub fn open(&mut self, index: usize) {
        self.selected = Some(index);
    }

    pub fn close(&mut self) {
        self.selected = None;
    }

    #[must_use]
    pub fn selected<'a>(&self, records: &'a [HouseholdRecord]) -> Option<&'a HouseholdRecord> {
        self.selected.and_then(|i| records.get(i))
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.selected.is_some()
    }
}
