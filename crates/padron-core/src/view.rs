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

//! Top-level view state: which screen is showing and which tab is active.

/// Two-stage flow of the app: pick a promoter, then view their households.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Stage {
    #[default]
    Picking,
    Viewing {
        promoter: String,
    },
}

impl Stage {
    /// Picking -> Viewing. Ignored when already viewing.
    pub fn select(&mut self, promoter: &str) {
        if matches!(self, Self::Picking) {
            *self = Self::Viewing {
                promoter: promoter.to_string(),
            };
        }
    }

    /// Viewing -> Picking.
    pub fn back(&mut self) {
        *self = Self::Picking;
    }

    #[must_use]
    pub fn promoter(&self) -> Option<&str> {
        match self {
            Self::Picking => None,
            Self::Viewing { promoter } => Some(promoter),
        }
    }
}

/// Renderer shown inside the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    List,
    Map,
}

impl Tab {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::List => "Lista",
            Self::Map => "Mapa",
        }
    }
}
