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

//! Dashboard state scoped to one promoter.

use log::debug;

use crate::record::{Dataset, HouseholdRecord};
use crate::view::Tab;

/// Records assigned to one promoter, plus the active tab.
#[derive(Debug)]
pub struct Dashboard {
    dataset: Dataset,
    promoter: String,
    subset: Vec<HouseholdRecord>,
    tab: Tab,
}

impl Dashboard {
    #[must_use]
    pub fn new(dataset: &Dataset, promoter: &str) -> Self {
        Self {
            dataset: dataset.clone(),
            promoter: promoter.to_string(),
            subset: filter_by_promoter(dataset, promoter),
            tab: Tab::default(),
        }
    }

    /// Recompute the subset if the dataset or promoter changed. Returns true if it did.
    pub fn refresh(&mut self, dataset: &Dataset, promoter: &str) -> bool {
        if self.dataset.same_as(dataset) && self.promoter == promoter {
            return false;
        }
        debug!("Refreshing dashboard subset for {promoter}");
        self.dataset = dataset.clone();
        self.promoter = promoter.to_string();
        self.subset = filter_by_promoter(dataset, promoter);
        true
    }

    #[must_use]
    pub fn records(&self) -> &[HouseholdRecord] {
        &self.subset
    }

    #[must_use]
    pub fn promoter(&self) -> &str {
        &self.promoter
    }

    #[must_use]
    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn set_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }
}

fn filter_by_promoter(dataset: &Dataset, promoter: &str) -> Vec<HouseholdRecord> {
    dataset
        .records()
        .iter()
        .filter(|r| r.promoter == promoter)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        Dataset::from_json_str(
            r#"[
                {"id": "1", "promoter": "Ana", "lat": 1, "lng": 1},
                {"id": "2", "promoter": "Luis", "lat": 1, "lng": 1},
                {"id": "3", "promoter": "Ana", "lat": 1, "lng": 1},
                {"id": "4", "promoter": "ana", "lat": 1, "lng": 1}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_subset_is_exact_match() {
        let dashboard = Dashboard::new(&dataset(), "Ana");
        let ids: Vec<&str> = dashboard.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_tab_switch_keeps_subset() {
        let mut dashboard = Dashboard::new(&dataset(), "Ana");
        assert_eq!(dashboard.tab(), Tab::List);
        let before = dashboard.records().to_vec();
        dashboard.set_tab(Tab::Map);
        assert_eq!(dashboard.records(), before.as_slice());
        dashboard.set_tab(Tab::List);
        assert_eq!(dashboard.records(), before.as_slice());
    }

    #[test]
    fn test_refresh_memoized_on_identity() {
        let data = dataset();
        let mut dashboard = Dashboard::new(&data, "Ana");
        assert!(!dashboard.refresh(&data.clone(), "Ana"));
        assert!(dashboard.refresh(&data, "Luis"));
        assert_eq!(dashboard.records().len(), 1);
        assert!(dashboard.refresh(&dataset(), "Luis"));
    }
}
