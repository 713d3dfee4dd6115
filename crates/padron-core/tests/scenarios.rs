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

//! End-to-end scenarios across normalization, picker, dashboard and views.

use padron_core::{
    list_promoters, Dashboard, Dataset, ListState, LocationError, MapViewState, Stage, Tab, UserPosition,
    DEFAULT_CENTER, UNASSIGNED_PROMOTER,
};
use padron_core::record::center_of;
use padron_core::{GeolocationTracker, PositionOptions, Unavailable};
use std::sync::Arc;
use std::time::Duration;

const THREE_HOUSEHOLDS: &str = r#"[
    {"id": "1", "promoter": "Ana", "headName": "Zoila Vargas", "lat": -11.93, "lng": -77.04},
    {"id": "2", "headName": "Felipa Condori", "lat": -11.94, "lng": -77.05},
    {"id": "3", "promoter": "Ana", "headName": "Betty Rojas", "lat": "-11.95", "lng": -77.06}
]"#;

#[test]
fn test_picker_then_list() {
    let dataset = Dataset::from_json_str(THREE_HOUSEHOLDS).unwrap();

    let summaries = list_promoters(dataset.records(), "");
    let pairs: Vec<(&str, usize)> = summaries.iter().map(|s| (s.name.as_str(), s.count)).collect();
    assert_eq!(pairs, vec![("Ana", 2), (UNASSIGNED_PROMOTER, 1)]);

    let mut stage = Stage::default();
    stage.select("Ana");
    let promoter = stage.promoter().unwrap();

    let mut dashboard = Dashboard::new(&dataset, promoter);
    let list = ListState::default();
    let names: Vec<&str> = list.visible(dashboard.records()).iter().map(|r| r.head_name.as_str()).collect();
    assert_eq!(names, vec!["Betty Rojas", "Zoila Vargas"]);

    dashboard.set_tab(Tab::Map);
    assert!(dashboard.records().iter().all(|r| r.promoter == "Ana"));
    assert_eq!(dashboard.records().len(), 2);

    stage.back();
    assert_eq!(stage, Stage::Picking);
}

#[test]
fn test_counts_independent_of_query() {
    let dataset = Dataset::from_json_str(THREE_HOUSEHOLDS).unwrap();
    for query in ["", "an", "sin", "zzz"] {
        for summary in list_promoters(dataset.records(), query) {
            let expected = dataset.records().iter().filter(|r| r.promoter == summary.name).count();
            assert_eq!(summary.count, expected, "query {query:?}");
        }
    }
}

#[test]
fn test_bad_latitude_excluded_everywhere() {
    let dataset = Dataset::from_json_str(
        r#"[{"id": "x", "promoter": "Ana", "headName": "Nadie", "lat": "not-a-number", "lng": -77.0}]"#,
    )
    .unwrap();
    assert!(dataset.is_empty());
    assert!(list_promoters(dataset.records(), "").is_empty());

    let dashboard = Dashboard::new(&dataset, "Ana");
    assert!(ListState::default().visible(dashboard.records()).is_empty());

    let map = MapViewState::default();
    let points = map.visible_points(dashboard.records());
    assert!(points.is_empty());
    assert_eq!(center_of(points.into_iter()), DEFAULT_CENTER);
}

#[test]
fn test_empty_query_preserves_order() {
    let dataset = Dataset::from_json_str(THREE_HOUSEHOLDS).unwrap();
    let unfiltered = list_promoters(dataset.records(), "");
    assert_eq!(list_promoters(dataset.records(), "  "), unfiltered);

    let mut map = MapViewState::default();
    map.toggle_fullscreen();
    let ids: Vec<&str> = map.visible_points(dataset.records()).iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
}

#[test]
fn test_fix_survives_later_error() {
    let tracker = GeolocationTracker::watch(
        Arc::new(Unavailable),
        PositionOptions::default(),
        Duration::from_secs(1),
        Arc::new(|| {}),
    );
    let fix = UserPosition {
        lat: -11.93,
        lng: -77.04,
        accuracy: 15.0,
    };
    tracker.record_update(Ok(fix));
    tracker.record_update(Err(LocationError::PermissionDenied));
    assert_eq!(tracker.position(), Some(fix));
}
