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

//! Core logic for the Padrón household field viewer.
//!
//! Everything here is independent of the GUI toolkit so it can be tested on
//! its own:
//!
//! - **Records**: loading and normalizing the bundled household dataset
//! - **Search**: approximate matching for promoter and household search
//! - **Geolocation**: continuous and one-shot device location
//! - **Markers**: clustered and flat marker layout strategies
//! - **Views**: stage/tab machine, dashboard subset, list and map state
//!
//! # Quick Start
//!
//! ```
//! use padron_core::{list_promoters, Dashboard, Dataset};
//!
//! let dataset = Dataset::from_json_str(
//!     r#"[{"promoter": "Ana", "headName": "Rosa", "lat": -12.0, "lng": -77.0}]"#,
//! ).unwrap();
//!
//! for summary in list_promoters(dataset.records(), "") {
//!     println!("{}: {}", summary.name, summary.count);
//! }
//!
//! let dashboard = Dashboard::new(&dataset, "Ana");
//! assert_eq!(dashboard.records().len(), 1);
//! ```

pub mod cluster;
pub mod dashboard;
pub mod fuzzy;
pub mod geolocation;
pub mod list;
pub mod map;
pub mod mercator;
pub mod promoter;
pub mod record;
pub mod view;

pub use cluster::{select_layer, ClusterSize, ClusteredLayer, FlatLayer, LayerItem, MarkerLayer, ScreenPoint};
pub use dashboard::Dashboard;
pub use fuzzy::{FuzzyMatcher, Searchable};
pub use geolocation::{
    FixedLocationProvider, GeolocationTracker, IpLocationProvider, LocationError, LocationProvider, PositionOptions,
    Unavailable, UserPosition,
};
pub use list::ListState;
pub use map::{FlyTo, MapViewState, Recenter};
pub use mercator::WebMercator;
pub use promoter::{list_promoters, PromoterSummary};
pub use record::{Dataset, DatasetError, HouseholdRecord, DEFAULT_CENTER, UNASSIGNED_PROMOTER};
pub use view::{Stage, Tab};
