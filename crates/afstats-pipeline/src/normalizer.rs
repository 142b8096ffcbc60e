// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Stats normalization: raw buffers and HAL geometry into algorithm inputs.
//!
//! Rectangle arithmetic is done in integer pixels, ratios in `f32`, and
//! every scaled value is rounded to the nearest integer.

use crate::algorithm::{AfRoiInfo, IdentifiedRoi, RoiList};
use afstats_structures::*;
use tracing::{trace, warn};

/// Lines that must be read before any PD data is usable.
pub const PD_EARLY_MIN_MARGIN: u32 = 10;

/// A primary region ending this close to the frame bottom reads the whole frame.
pub const PD_FULL_FRAME_GUARD: u32 = 30;

pub const MAX_FACE_ROIS: usize = 10;

const FACE_ROI_WEIGHT: u32 = 1;
const TRACKER_ROI_WEIGHT: u32 = 1;

/// Bytes per BAF region record: id, H sharpness, V sharpness, pixel count.
pub const BAF_RECORD_SIZE: usize = 16;

// ═══════════════════════════════════════════════════════════
// Region scaling
// ═══════════════════════════════════════════════════════════

/// Converts a HAL AF region into sensor-output space.
///
/// The region is intersected with the crop window first. A zero weight or
/// a region outside the crop yields the default (General, count 0).
pub fn retrieve_focus_region(
    region: Option<&WeightedRegion>,
    crop: &CropWindow,
    active_array: Dimension,
    ratios: ScaleRatios,
) -> AfRoiInfo {
    let Some(region) = region else {
        return AfRoiInfo::default();
    };
    if region.weight <= 0 {
        return AfRoiInfo::default();
    }

    let crop = if crop.is_empty() {
        CropWindow::new(0, 0, active_array.width as i32, active_array.height as i32)
    } else {
        *crop
    };
    let crop_right = crop.left.saturating_add(crop.width);
    let crop_bottom = crop.top.saturating_add(crop.height);

    if crop.top > region.y_max || region.y_min > crop_bottom || crop.left > region.x_max || region.x_min > crop_right {
        trace!("[AF-IO] AF region {:?} outside crop {:?}", region, crop);
        return AfRoiInfo::default();
    }

    let x_min = region.x_min.max(crop.left);
    let y_min = region.y_min.max(crop.top);
    let x_max = region.x_max.min(crop_right);
    let y_max = region.y_max.min(crop_bottom);

    let roi = Rect::new(
        round_to_u32(x_min as f32 * ratios.width),
        round_to_u32(y_min as f32 * ratios.height),
        round_to_u32(x_max.saturating_sub(x_min) as f32 * ratios.width),
        round_to_u32(y_max.saturating_sub(y_min) as f32 * ratios.height),
    );

    AfRoiInfo {
        roi_type: FocusRegionType::Touch,
        count: 1,
        roi: WeightedRoi {
            roi,
            weight: region.weight as u32,
        },
    }
}

/// Maps a sensor-output ROI back into active-array space for HAL metadata.
pub fn inverse_scale_roi(roi: &WeightedRoi, ratios: ScaleRatios) -> WeightedRegion {
    let inverse = ratios.inverse();
    let x_min = round_to_u32(roi.roi.left as f32 * inverse.width) as i32;
    let y_min = round_to_u32(roi.roi.top as f32 * inverse.height) as i32;
    let width = round_to_u32(roi.roi.width as f32 * inverse.width) as i32;
    let height = round_to_u32(roi.roi.height as f32 * inverse.height) as i32;
    WeightedRegion::new(
        x_min,
        y_min,
        x_min.saturating_add(width),
        y_min.saturating_add(height),
        roi.weight as i32,
    )
}

pub fn scale_rect(rect: &Rect, ratios: ScaleRatios) -> Rect {
    Rect::new(
        round_to_u32(rect.left as f32 * ratios.width),
        round_to_u32(rect.top as f32 * ratios.height),
        round_to_u32(rect.width as f32 * ratios.width),
        round_to_u32(rect.height as f32 * ratios.height),
    )
}

/// Scaler crop region in sensor-output space.
///
/// A missing or zero-sized crop falls back to the full active array.
pub fn crop_window_info(crop: Option<&CropWindow>, ratios: ScaleRatios, active_array: Dimension) -> Rect {
    match crop {
        Some(c) if !c.is_empty() => Rect::new(
            round_to_u32(c.left as f32 * ratios.width),
            round_to_u32(c.top as f32 * ratios.height),
            round_to_u32(c.width as f32 * ratios.width),
            round_to_u32(c.height as f32 * ratios.height),
        ),
        _ => Rect::new(0, 0, active_array.width, active_array.height),
    }
}

/// Stabilized and unstabilized face rectangles in sensor-output space.
pub fn faces_to_sensor(info: &FaceRoiInfo, ratios: ScaleRatios) -> (RoiList, RoiList) {
    let convert = |faces: &[FaceRect]| RoiList {
        request_id: info.request_id,
        rois: faces
            .iter()
            .take(MAX_FACE_ROIS)
            .map(|face| IdentifiedRoi {
                id: face.id,
                roi: WeightedRoi {
                    roi: scale_rect(&face.rect, ratios),
                    weight: FACE_ROI_WEIGHT,
                },
            })
            .collect(),
    };
    (convert(&info.stabilized), convert(&info.unstabilized))
}

pub fn tracker_to_sensor(tracker: &TrackerRoi, request_id: u64, ratios: ScaleRatios) -> RoiList {
    RoiList {
        request_id,
        rois: vec![IdentifiedRoi {
            id: tracker.id,
            roi: WeightedRoi {
                roi: scale_rect(&tracker.rect, ratios),
                weight: TRACKER_ROI_WEIGHT,
            },
        }],
    }
}

// ═══════════════════════════════════════════════════════════
// Region grouping and PD line estimates
// ═══════════════════════════════════════════════════════════

/// Bounding rectangle of every input, `None` for an empty slice.
pub fn group_regions(rects: &[Rect]) -> Option<Rect> {
    Rect::bounding_box(rects)
}

/// Bounding rectangle of the primary BAF windows.
pub fn primary_region_bounds(rois: &[BafRoi]) -> Option<Rect> {
    let primaries: Vec<Rect> = rois
        .iter()
        .filter(|r| r.kind == BafRoiKind::Primary)
        .map(|r| r.rect)
        .collect();
    group_regions(&primaries)
}

/// Lines to read for the early-interrupt PD pass.
///
/// `primary_bottom` is the bottom edge of the grouped primary region and
/// `frame_height` the usable CAMIF height.
pub fn pd_early_lines(primary_bottom: u32, frame_height: u32, binning: bool) -> u32 {
    let lines = if primary_bottom < PD_EARLY_MIN_MARGIN {
        0
    } else if primary_bottom > frame_height.saturating_sub(PD_FULL_FRAME_GUARD) {
        frame_height
    } else {
        primary_bottom - PD_EARLY_MIN_MARGIN
    };
    if binning {
        lines.saturating_mul(2)
    } else {
        lines
    }
}

/// Lines to read for the end-of-frame PD pass.
pub fn pd_normal_lines(frame_height: u32, binning: bool) -> u32 {
    if binning {
        frame_height.saturating_mul(2)
    } else {
        frame_height
    }
}

// ═══════════════════════════════════════════════════════════
// Exposure
// ═══════════════════════════════════════════════════════════

pub fn fps_from_frame_duration(frame_duration_ns: u64) -> Option<f32> {
    if frame_duration_ns == 0 {
        return None;
    }
    Some((1e9_f64 / frame_duration_ns as f64) as f32)
}

pub fn aec_info(frame: &AecFrameInfo, frame_duration_ns: Option<u64>) -> AecInfo {
    AecInfo {
        lux_index: frame.lux_index,
        current_gain: frame.real_gain,
        exposure_time_ns: frame.exposure_time_ns,
        current_fps: frame_duration_ns.and_then(fps_from_frame_duration).unwrap_or(0.0),
        brightness_value: frame.brightness_value,
    }
}

// ═══════════════════════════════════════════════════════════
// Raw BAF buffer
// ═══════════════════════════════════════════════════════════

fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

/// Parses a raw BAF buffer of little-endian 16-byte region records.
pub fn parse_baf_stats(raw: &[u8], request_id: u64, startup_mode: StartupMode) -> AfResult<BafStats> {
    if raw.len() % BAF_RECORD_SIZE != 0 {
        warn!(
            "[AF-IO] BAF buffer of {} bytes is not a multiple of {}",
            raw.len(),
            BAF_RECORD_SIZE
        );
        return Err(AfError::InvalidInput(format!(
            "BAF buffer length {} not a multiple of {}",
            raw.len(),
            BAF_RECORD_SIZE
        )));
    }

    let regions = raw
        .chunks_exact(BAF_RECORD_SIZE)
        .map(|record| BafRoiStats {
            roi_id: read_u32_le(record, 0),
            h_sharpness: read_u32_le(record, 4),
            v_sharpness: read_u32_le(record, 8),
            pixel_count: read_u32_le(record, 12),
        })
        .collect();

    Ok(BafStats {
        request_id,
        startup_mode,
        regions,
    })
}
