//! # Size Calculation Module
//!
//! Pure target-size math for aspect-ratio preserving resizes.
//!
//! "Length" here means the longest side of the image, i.e. the greater of
//! width and height; "width" is implicitly the shortest side. The bounding
//! box is therefore orientation-agnostic: a 1920x1080 box constrains a
//! portrait image exactly like a landscape one.

/// A resize bounding box expressed as (longest side, shortest side).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    /// Target for the longest side of the image.
    pub length: u32,
    /// Target for the shortest side of the image.
    pub width: u32,
}

impl BoundingBox {
    pub const HD: BoundingBox = BoundingBox { length: 1920, width: 1080 };
    pub const ULTRA_HD: BoundingBox = BoundingBox { length: 3840, width: 2160 };

    pub fn new(length: u32, width: u32) -> Self {
        Self { length, width }
    }
}

/// Compute new dimensions for an image constrained by `max_length` on its
/// longest side and `max_width` on its shortest side.
///
/// Both sides are scaled by the larger of the two required factors, so the
/// image covers the requested box on at least one axis and may exceed it on
/// the other rather than distort. Results are truncated to whole pixels.
///
/// Inputs must be positive; there are no failure modes.
pub fn compute_target_size(
    width: u32,
    height: u32,
    max_length: u32,
    max_width: u32,
) -> (u32, u32) {
    let orig_length = width.max(height);
    let orig_width = width.min(height);

    let length_ratio = max_length as f64 / orig_length as f64;
    let width_ratio = max_width as f64 / orig_width as f64;

    // The larger factor keeps the current aspect ratio of the image.
    let resize_factor = length_ratio.max(width_ratio);

    let new_width = (resize_factor * width as f64) as u32;
    let new_height = (resize_factor * height as f64) as u32;

    (new_width, new_height)
}
