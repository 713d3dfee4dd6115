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

//! Basemap tile sources and the on-disk tile cache.

use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};
use walkers::sources::{Attribution, TileSource};
use walkers::{HttpOptions, HttpTiles, TileId};

use crate::cache::CachePartition;

/// Tiles are only limited by age; walkers decides what to fetch.
const TILE_CACHE_MAX_ENTRIES: usize = usize::MAX;

/// Basemap styles the map tab can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileStyle {
    #[default]
    CartoLight,
    CartoDark,
    OpenStreetMap,
}

impl TileStyle {
    pub const ALL: [TileStyle; 3] = [TileStyle::CartoLight, TileStyle::CartoDark, TileStyle::OpenStreetMap];

    /// Name shown in the basemap selector.
    pub fn label(&self) -> &'static str {
        match self {
            TileStyle::CartoLight => "Claro",
            TileStyle::CartoDark => "Oscuro",
            TileStyle::OpenStreetMap => "OpenStreetMap",
        }
    }

    /// Directory name of this style's tile cache partition.
    pub fn as_str(&self) -> &'static str {
        match self {
            TileStyle::CartoLight => "carto_light",
            TileStyle::CartoDark => "carto_dark",
            TileStyle::OpenStreetMap => "osm",
        }
    }

    /// Short attribution line drawn over the map.
    pub fn attribution_text(&self) -> &'static str {
        self.source().attribution().text
    }

    fn source(&self) -> StyleSource {
        StyleSource(*self)
    }
}

/// Tile source for a [`TileStyle`].
/// Carto styles use subdomain load balancing across a-d.basemaps.cartocdn.com
struct StyleSource(TileStyle);

impl TileSource for StyleSource {
    fn tile_url(&self, tile_id: TileId) -> String {
        match self.0 {
            TileStyle::CartoLight | TileStyle::CartoDark => {
                let subdomain = ['a', 'b', 'c', 'd'][((tile_id.x + tile_id.y) % 4) as usize];
                let layer = if self.0 == TileStyle::CartoDark {
                    "dark_all"
                } else {
                    "light_all"
                };
                format!(
                    "https://{}.basemaps.cartocdn.com/{}/{}/{}/{}.png",
                    subdomain, layer, tile_id.zoom, tile_id.x, tile_id.y
                )
            }
            TileStyle::OpenStreetMap => format!(
                "https://tile.openstreetmap.org/{}/{}/{}.png",
                tile_id.zoom, tile_id.x, tile_id.y
            ),
        }
    }

    fn attribution(&self) -> Attribution {
        match self.0 {
            TileStyle::CartoLight | TileStyle::CartoDark => Attribution {
                text: "© OpenStreetMap contributors, © CARTO",
                url: "https://carto.com/attributions",
                logo_light: None,
                logo_dark: None,
            },
            TileStyle::OpenStreetMap => Attribution {
                text: "© OpenStreetMap contributors",
                url: "https://www.openstreetmap.org/copyright",
                logo_light: None,
                logo_dark: None,
            },
        }
    }
}

/// Prune the style's cache partition and open an `HttpTiles` backed by it.
pub fn open_tiles(style: TileStyle, max_age: Duration, ctx: &egui::Context) -> HttpTiles {
    let partition = CachePartition::open(
        &format!("tiles/{}", style.as_str()),
        TILE_CACHE_MAX_ENTRIES,
        max_age,
    );
    let removed = partition.prune();
    if removed > 0 {
        info!("Removed {} expired {} tiles", removed, style.as_str());
    }

    let http_options = HttpOptions {
        cache: Some(partition.dir().to_path_buf()),
        ..Default::default()
    };
    HttpTiles::with_options(style.source(), http_options, ctx.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carto_urls_balance_subdomains() {
        let source = TileStyle::CartoDark.source();
        let a = source.tile_url(TileId { x: 0, y: 0, zoom: 3 });
        let b = source.tile_url(TileId { x: 1, y: 0, zoom: 3 });
        assert_eq!(a, "https://a.basemaps.cartocdn.com/dark_all/3/0/0.png");
        assert_eq!(b, "https://b.basemaps.cartocdn.com/dark_all/3/1/0.png");
    }

    #[test]
    fn test_osm_url() {
        let url = TileStyle::OpenStreetMap.source().tile_url(TileId { x: 5, y: 7, zoom: 4 });
        assert_eq!(url, "https://tile.openstreetmap.org/4/5/7.png");
    }

    #[test]
    fn test_every_style_has_attribution() {
        for style in TileStyle::ALL {
            assert!(style.attribution_text().contains("OpenStreetMap"));
        }
    }
}
