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

//! Marker layout strategies.
//!
//! The map hands over marker positions already projected to screen pixels and
//! gets back what to draw: single markers and clusters. Which strategy is used
//! is decided once at startup by [`select_layer`].

use std::collections::HashMap;

/// Default cluster radius around a cluster anchor, in pixels.
pub const CLUSTER_RADIUS_PX: f32 = 50.0;

/// A marker position in screen space, tagged with the caller's index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub index: usize,
    pub x: f32,
    pub y: f32,
}

/// Icon size bucket for a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterSize {
    Small,
    Medium,
    Large,
}

impl ClusterSize {
    #[must_use]
    pub fn for_count(count: usize) -> Self {
        match count {
            0..=9 => Self::Small,
            10..=29 => Self::Medium,
            _ => Self::Large,
        }
    }
}

/// Something to draw on the map.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerItem {
    Single(ScreenPoint),
    Cluster {
        x: f32,
        y: f32,
        /// Indices of the member points, in input order.
        members: Vec<usize>,
    },
}

impl LayerItem {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Cluster { members, .. } => members.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Strategy that turns projected points into drawable items.
pub trait MarkerLayer: Send + Sync {
    fn name(&self) -> &'static str;

    fn layout(&self, points: &[ScreenPoint]) -> Vec<LayerItem>;
}

/// Every point drawn as its own marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatLayer;

impl MarkerLayer for FlatLayer {
    fn name(&self) -> &'static str {
        "flat"
    }

    fn layout(&self, points: &[ScreenPoint]) -> Vec<LayerItem> {
        points.iter().copied().map(LayerItem::Single).collect()
    }
}

/// Greedy grid clustering in screen space.
#[derive(Debug, Clone, Copy)]
pub struct ClusteredLayer {
    pub radius_px: f32,
}

impl Default for ClusteredLayer {
    fn default() -> Self {
        Self {
            radius_px: CLUSTER_RADIUS_PX,
        }
    }
}

struct Group {
    anchor: (f32, f32),
    members: Vec<ScreenPoint>,
}

impl ClusteredLayer {
    #[allow(clippy::cast_possible_truncation, reason = "screen coordinates fit in i32 cells")]
    fn cell(&self, x: f32, y: f32) -> (i32, i32) {
        ((x / self.radius_px).floor() as i32, (y / self.radius_px).floor() as i32)
    }
}

impl MarkerLayer for ClusteredLayer {
    fn name(&self) -> &'static str {
        "clustered"
    }

    fn layout(&self, points: &[ScreenPoint]) -> Vec<LayerItem> {
        let mut groups: Vec<Group> = Vec::new();
        let mut grid: HashMap<(i32, i32), Vec<usize>> = HashMap::new();
        let radius_sq = self.radius_px * self.radius_px;

        for point in points {
            let (cx, cy) = self.cell(point.x, point.y);

            // Anchors within the radius can only live in the 3x3 neighborhood
            let nearby = (-1..=1)
                .flat_map(|dx| (-1..=1).map(move |dy| (cx + dx, cy + dy)))
                .filter_map(|cell| grid.get(&cell))
                .flatten()
                .copied()
                .filter(|&g| {
                    let (ax, ay) = groups[g].anchor;
                    (ax - point.x).powi(2) + (ay - point.y).powi(2) <= radius_sq
                })
                .min();

            if let Some(g) = nearby {
                groups[g].members.push(*point);
            } else {
                grid.entry((cx, cy)).or_default().push(groups.len());
                groups.push(Group {
                    anchor: (point.x, point.y),
                    members: vec![*point],
                });
            }
        }

        groups
            .into_iter()
            .map(|group| {
                if group.members.len() == 1 {
                    return LayerItem::Single(group.members[0]);
                }
                #[allow(clippy::cast_precision_loss, reason = "member counts are small")]
                let n = group.members.len() as f32;
                let x = group.members.iter().map(|p| p.x).sum::<f32>() / n;
                let y = group.members.iter().map(|p| p.y).sum::<f32>() / n;
                LayerItem::Cluster {
                    x,
                    y,
                    members: group.members.iter().map(|p| p.index).collect(),
                }
            })
            .collect()
    }
}

/// Pick the marker strategy for this run.
#[must_use]
pub fn select_layer(clustering_available: bool) -> Box<dyn MarkerLayer> {
    if clustering_available {
        Box::new(ClusteredLayer::default())
    } else {
        log::info!("Marker clustering unavailable; drawing individual markers");
        Box::new(FlatLayer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(index: usize, x: f32, y: f32) -> ScreenPoint {
        ScreenPoint { index, x, y }
    }

    #[test]
    fn test_cluster_size_buckets() {
        assert_eq!(ClusterSize::for_count(2), ClusterSize::Small);
        assert_eq!(ClusterSize::for_count(9), ClusterSize::Small);
        assert_eq!(ClusterSize::for_count(10), ClusterSize::Medium);
        assert_eq!(ClusterSize::for_count(29), ClusterSize::Medium);
        assert_eq!(ClusterSize::for_count(30), ClusterSize::Large);
    }

    #[test]
    fn test_nearby_points_cluster() {
        let layer = ClusteredLayer::default();
        let items = layer.layout(&[pt(0, 100.0, 100.0), pt(1, 120.0, 110.0), pt(2, 400.0, 400.0)]);
        assert_eq!(items.len(), 2);
        match &items[0] {
            LayerItem::Cluster { x, y, members } => {
                assert_eq!(members, &vec![0, 1]);
                assert!((x - 110.0).abs() < 1e-3);
                assert!((y - 105.0).abs() < 1e-3);
            }
            other => panic!("expected cluster, got {other:?}"),
        }
        assert_eq!(items[1], LayerItem::Single(pt(2, 400.0, 400.0)));
    }

    #[test]
    fn test_cluster_across_cell_boundary() {
        let layer = ClusteredLayer::default();
        let items = layer.layout(&[pt(0, 49.0, 49.0), pt(1, 51.0, 51.0)]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].len(), 2);
    }

    #[test]
    fn test_flat_layer_keeps_every_point() {
        let points = [pt(0, 1.0, 1.0), pt(1, 1.0, 1.0), pt(2, 1.0, 1.0)];
        let items = FlatLayer.layout(&points);
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|i| matches!(i, LayerItem::Single(_))));
    }

    #[test]
    fn test_select_layer() {
        assert_eq!(select_layer(true).name(), "clustered");
        assert_eq!(select_layer(false).name(), "flat");
    }

    #[test]
    fn test_every_point_accounted_for() {
        let points: Vec<ScreenPoint> = (0..200)
            .map(|i| {
                #[allow(clippy::cast_precision_loss, reason = "test data")]
                let f = i as f32;
                pt(i, (f * 37.0) % 800.0, (f * 53.0) % 600.0)
            })
            .collect();
        let items = ClusteredLayer::default().layout(&points);
        let total: usize = items.iter().map(LayerItem::len).sum();
        assert_eq!(total, points.len());
    }
}
