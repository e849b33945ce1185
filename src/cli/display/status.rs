// Copyright 2025 JiangLong.
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

//! Status icons and colors for rollout output

use comfy_table::Color as TableColor;

/// Color theme for status output
#[derive(Debug, Clone, Copy)]
pub struct ColorTheme {
    pub success: TableColor,
    pub warning: TableColor,
    pub error: TableColor,
    pub info: TableColor,
    pub muted: TableColor,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            success: TableColor::Green,
            warning: TableColor::Yellow,
            error: TableColor::Red,
            info: TableColor::Cyan,
            muted: TableColor::DarkGrey,
        }
    }
}

impl ColorTheme {
    /// Color for a ready/desired replica pair
    pub fn get_replica_color(&self, ready: i32, desired: i32) -> TableColor {
        match RolloutState::of(ready, desired) {
            RolloutState::ScaledDown => self.muted,
            RolloutState::Ready => self.success,
            RolloutState::Progressing => self.warning,
            RolloutState::Unavailable => self.error,
        }
    }

    /// Color for a pod phase as reported by the API server
    pub fn get_phase_color(&self, phase: &str) -> TableColor {
        match phase {
            "Running" | "Succeeded" => self.success,
            "Pending" => self.warning,
            "Failed" => self.error,
            _ => self.muted,
        }
    }
}

/// Where a pooler deployment stands, from its replica counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloutState {
    ScaledDown,
    Ready,
    Progressing,
    Unavailable,
}

impl RolloutState {
    pub fn of(ready: i32, desired: i32) -> Self {
        if desired <= 0 {
            Self::ScaledDown
        } else if ready >= desired {
            Self::Ready
        } else if ready > 0 {
            Self::Progressing
        } else {
            Self::Unavailable
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            Self::ScaledDown => "Scaled down",
            Self::Ready => "Ready",
            Self::Progressing => "Progressing",
            Self::Unavailable => "Unavailable",
        }
    }
}

/// Status icons
pub struct StatusIcon;

impl StatusIcon {
    pub const SUCCESS: &'static str = "✓";
    pub const WARNING: &'static str = "⚠";
    pub const ERROR: &'static str = "✗";
    pub const IDLE: &'static str = "○";

    pub fn get_replica_icon(ready: i32, desired: i32) -> &'static str {
        match RolloutState::of(ready, desired) {
            RolloutState::ScaledDown => Self::IDLE,
            RolloutState::Ready => Self::SUCCESS,
            RolloutState::Progressing => Self::WARNING,
            RolloutState::Unavailable => Self::ERROR,
        }
    }
}
