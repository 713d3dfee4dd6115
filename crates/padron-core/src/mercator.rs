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

//! Web Mercator projection helpers.

/// Equatorial circumference used by Web Mercator, in meters.
const EARTH_CIRCUMFERENCE_M: f64 = 40_075_016.686;

/// Tile edge length in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Web Mercator projection utilities
#[derive(Debug)]
pub struct WebMercator;

impl WebMercator {
    /// Ground distance covered by one screen pixel at `lat` and `zoom`.
    #[must_use]
    pub fn meters_per_pixel(lat: f64, zoom: f64) -> f64 {
        EARTH_CIRCUMFERENCE_M * lat.to_radians().cos() / (TILE_SIZE * zoom.exp2())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meters_per_pixel_shrinks_toward_poles() {
        let equator = WebMercator::meters_per_pixel(0.0, 17.0);
        let lima = WebMercator::meters_per_pixel(-12.0464, 17.0);
        assert!(lima < equator);
        assert!((lima / equator - (-12.0464_f64).to_radians().cos()).abs() < 1e-12);
    }

    #[test]
    fn test_meters_per_pixel_at_equator() {
        // ~156 km per pixel at zoom 0, halving every level
        let z0 = WebMercator::meters_per_pixel(0.0, 0.0);
        assert!((z0 - 156_543.03).abs() < 1.0);
        assert!((WebMercator::meters_per_pixel(0.0, 1.0) - z0 / 2.0).abs() < 1e-6);
    }
}
