//! Rasterizes scaled detections onto an RGBA canvas.
//!
//! imageproc walks every pixel of a line or circle it is handed, inside the
//! canvas or not, so geometry is clipped to the canvas here first.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{Blend, draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect as PixelRect;

use crate::detection::scale::ScaledDetection;
use crate::models::{Point, Rect};

/// Stroke and marker settings for the overlay.
#[derive(Debug, Clone)]
pub struct OverlayStyle {
    /// Bounding box stroke width in pixels.
    pub box_stroke: u32,
    /// Side of the square marker drawn on each landmark point, in pixels.
    pub marker_size: u32,
    /// Opacity of connected landmark paths, 0.0 to 1.0.
    pub path_opacity: f32,
    pub draw_landmarks: bool,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            box_stroke: 2,
            marker_size: 2,
            path_opacity: 0.6,
            draw_landmarks: true,
        }
    }
}

impl OverlayStyle {
    pub fn with_box_stroke(mut self, width: u32) -> Self {
        self.box_stroke = width;
        self
    }

    pub fn with_marker_size(mut self, size: u32) -> Self {
        self.marker_size = size;
        self
    }

    pub fn with_path_opacity(mut self, opacity: f32) -> Self {
        self.path_opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_landmarks(mut self, draw: bool) -> Self {
        self.draw_landmarks = draw;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct OverlayRenderer {
    style: OverlayStyle,
}

impl OverlayRenderer {
    pub fn new(style: OverlayStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    /// Draw every detection. Coordinates are display coordinates, so the
    /// canvas is expected to be the image as displayed.
    pub fn render(&self, canvas: &mut RgbaImage, detections: &[ScaledDetection]) {
        for detection in detections {
            self.render_one(canvas, detection);
        }
    }

    fn render_one(&self, canvas: &mut RgbaImage, detection: &ScaledDetection) {
        let color = detection.color();
        self.draw_box(canvas, &detection.bounding_box, color);

        if !self.style.draw_landmarks {
            return;
        }
        let Some(landmarks) = &detection.landmarks else {
            return;
        };

        // One pixel of slack so clipped path ends still reach the border.
        let min = Point::new(-1.0, -1.0);
        let max = Point::new(canvas.width() as f64 + 1.0, canvas.height() as f64 + 1.0);
        let path_color = with_alpha(color, self.style.path_opacity);

        for (kind, points) in landmarks.groups() {
            if kind.is_connected() && points.len() > 1 {
                let mut blended = Blend(std::mem::take(canvas));
                for pair in points.windows(2) {
                    if let Some((a, b)) = clip_segment(pair[0], pair[1], min, max) {
                        draw_line_segment_mut(&mut blended, to_f32(a), to_f32(b), path_color);
                    }
                }
                *canvas = blended.0;
            }
            for point in points {
                self.draw_marker(canvas, *point, color);
            }
        }
    }

    /// Square marker centred on the point. Markers entirely off the canvas
    /// are skipped.
    fn draw_marker(&self, canvas: &mut RgbaImage, point: Point, color: Rgba<u8>) {
        let size = self.style.marker_size;
        if size == 0 || !(point.x.is_finite() && point.y.is_finite()) {
            return;
        }
        let half = size as f64 / 2.0;
        let left = (point.x - half).round();
        let top = (point.y - half).round();
        let side = size as f64;
        if left + side <= 0.0
            || top + side <= 0.0
            || left >= canvas.width() as f64
            || top >= canvas.height() as f64
        {
            return;
        }
        draw_filled_rect_mut(canvas, PixelRect::at(left as i32, top as i32).of_size(size, size), color);
    }

    /// Stroke grows inward from the box edge. Zero-area boxes draw nothing.
    ///
    /// Edges beyond the canvas are pulled in to just outside it, far enough
    /// that every stroke ring on that side stays off-canvas.
    fn draw_box(&self, canvas: &mut RgbaImage, rect: &Rect, color: Rgba<u8>) {
        if rect.is_degenerate() || !rect.is_finite() {
            return;
        }
        let canvas_w = canvas.width() as i64;
        let canvas_h = canvas.height() as i64;
        let left = rect.min_x().round();
        let top = rect.min_y().round();
        let right = rect.max_x().round();
        let bottom = rect.max_y().round();
        if right <= 0.0 || bottom <= 0.0 || left >= canvas_w as f64 || top >= canvas_h as f64 {
            return;
        }

        let margin = (self.style.box_stroke as i64).min(canvas_w.max(canvas_h)) + 1;
        let left = (left as i64).max(-margin);
        let top = (top as i64).max(-margin);
        let right = (right as i64).min(canvas_w + margin);
        let bottom = (bottom as i64).min(canvas_h + margin);
        let width = right - left;
        let height = bottom - top;

        for inset in 0..self.style.box_stroke as i64 {
            let w = width - 2 * inset;
            let h = height - 2 * inset;
            if w <= 0 || h <= 0 {
                break;
            }
            let ring = PixelRect::at((left + inset) as i32, (top + inset) as i32).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(canvas, ring, color);
        }
    }
}

/// Clips the segment `a`-`b` to the box spanned by `min` and `max`
/// (Liang-Barsky). `None` when nothing of it lies inside.
fn clip_segment(a: Point, b: Point, min: Point, max: Point) -> Option<(Point, Point)> {
    if !(a.x.is_finite() && a.y.is_finite() && b.x.is_finite() && b.y.is_finite()) {
        return None;
    }
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let mut enter = 0.0_f64;
    let mut exit = 1.0_f64;

    for (p, q) in [(-dx, a.x - min.x), (dx, max.x - a.x), (-dy, a.y - min.y), (dy, max.y - a.y)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            if t > exit {
                return None;
            }
            enter = enter.max(t);
        } else {
            if t < enter {
                return None;
            }
            exit = exit.min(t);
        }
    }

    Some((
        Point::new(a.x + enter * dx, a.y + enter * dy),
        Point::new(a.x + exit * dx, a.y + exit * dy),
    ))
}

fn to_f32(p: Point) -> (f32, f32) {
    (p.x as f32, p.y as f32)
}

fn with_alpha(color: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let Rgba([r, g, b, a]) = color;
    Rgba([r, g, b, (a as f32 * opacity).round() as u8])
}
