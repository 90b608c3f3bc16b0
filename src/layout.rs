//! Watermark placement calculations
//!
//! All lengths are PDF points (1/72 inch) with the origin at the bottom-left
//! corner of the page.

/// Default watermark rotation in degrees (negative is clockwise)
pub const DEFAULT_ROTATION_DEGREES: f64 = -45.0;

/// Convert millimeters to points
pub fn mm_to_pt(mm: f64) -> f64 {
    mm * 72.0 / 25.4
}

/// Page dimensions as read from the page's MediaBox
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
}

impl PageGeometry {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// US Letter size (8.5" × 11")
    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }

    /// A4 size (210mm × 297mm)
    pub fn a4() -> Self {
        Self::new(mm_to_pt(210.0), mm_to_pt(297.0))
    }
}

/// Size of the rendered, un-rotated watermark text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
}

/// Where to draw the watermark text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Baseline origin of the un-rotated text
    pub x: f64,
    pub y: f64,
    /// Rotation applied around (x, y)
    pub rotation_degrees: f64,
}

/// Axis-aligned bounding box (width, height) of the text after rotation
pub fn rotated_bounds(text: &TextMetrics, rotation_degrees: f64) -> (f64, f64) {
    let theta = rotation_degrees.to_radians();
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());

    let width = text.width * cos + text.height * sin;
    let height = text.height * cos + text.width * sin;
    (width, height)
}

/// Calculate the text origin that centers the rotated text box on the page
///
/// The vertical offset is added rather than subtracted: the origin is the
/// baseline start of the text, and with a clockwise rotation the rotated box
/// hangs below it. This matches rendered output and must not be "fixed" to
/// mirror the horizontal formula.
///
/// Text larger than the page is not clamped; coordinates may go negative.
pub fn calculate_placement(
    page: &PageGeometry,
    text: &TextMetrics,
    rotation_degrees: f64,
) -> Placement {
    let (rotated_width, rotated_height) = rotated_bounds(text, rotation_degrees);

    Placement {
        x: page.width / 2.0 - rotated_width / 2.0,
        y: page.height / 2.0 + rotated_height / 2.0,
        rotation_degrees,
    }
}
