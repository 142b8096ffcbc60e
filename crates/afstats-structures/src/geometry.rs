// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Rectangle and region geometry.
//!
//! Two coordinate spaces are in play: the sensor active-array space used by
//! HAL metadata (AF regions, crop window) and the sensor-output (CAMIF) space
//! used by the stats hardware and the algorithm. [`ScaleRatios`] converts
//! between them.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in integer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.left.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.top.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(left, top, right - left, bottom - top)
    }

    /// Bounding box of every rectangle in `rects`, `None` when empty.
    pub fn bounding_box<'a, I>(rects: I) -> Option<Rect>
    where
        I: IntoIterator<Item = &'a Rect>,
    {
        let mut iter = rects.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(first, |acc, r| acc.union(r)))
    }
}

/// HAL weighted region in active-array coordinates (`x_max`/`y_max` exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct WeightedRegion {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
    pub weight: i32,
}

impl WeightedRegion {
    pub const fn new(x_min: i32, y_min: i32, x_max: i32, y_max: i32, weight: i32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
            weight,
        }
    }
}

/// HAL scaler crop region in active-array coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct CropWindow {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl CropWindow {
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// Rectangle tagged with a weight, in sensor-output space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct WeightedRoi {
    pub roi: Rect,
    pub weight: u32,
}

/// Pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct Dimension {
    pub width: u32,
    pub height: u32,
}

impl Dimension {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Width/height ratios of sensor-output resolution over active-array size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleRatios {
    pub width: f32,
    pub height: f32,
}

impl ScaleRatios {
    /// Ratios from sensor-output resolution to active-array size.
    ///
    /// Returns `None` when any dimension is zero.
    pub fn new(sensor: Dimension, active_array: Dimension) -> Option<Self> {
        if sensor.width == 0 || sensor.height == 0 || active_array.width == 0 || active_array.height == 0 {
            return None;
        }
        Some(Self {
            width: sensor.width as f32 / active_array.width as f32,
            height: sensor.height as f32 / active_array.height as f32,
        })
    }

    /// Reciprocal ratios (sensor-output space back to active array).
    pub fn inverse(&self) -> Self {
        Self {
            width: 1.0 / self.width,
            height: 1.0 / self.height,
        }
    }
}

impl Default for ScaleRatios {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
        }
    }
}

/// Rounds to the nearest integer and clamps negatives to zero.
pub fn round_to_u32(value: f32) -> u32 {
    if value <= 0.0 {
        0
    } else {
        value.round() as u32
    }
}
