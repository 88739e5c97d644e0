//! Letterbox preprocessing for square-input detection models.
//!
//! Frames are scaled to fit the model canvas with their aspect ratio intact,
//! the remainder is filled with neutral gray, and the mapping is recorded so
//! detections can be carried back to source pixels:
//!
//! `x_raw = (x_inf - pad_left) / scale`

use image::imageops::FilterType;
use image::DynamicImage;
use sentinel_models::BoundingBox;

use crate::error::{VisionError, VisionResult};

/// Neutral gray used for padding (YOLO convention).
pub const PADDING_VALUE: u8 = 114;

/// Coordinate mapping between the source frame and the model canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxMeta {
    /// Original frame width in pixels
    pub raw_width: u32,
    /// Original frame height in pixels
    pub raw_height: u32,
    /// Square model input side in pixels
    pub input_size: u32,
    /// Scale factor applied to the raw frame (min of x/y scales)
    pub scale: f32,
    /// Left padding in model space
    pub pad_left: u32,
    /// Top padding in model space
    pub pad_top: u32,
    /// Scaled frame width before padding
    pub scaled_width: u32,
    /// Scaled frame height before padding
    pub scaled_height: u32,
}

impl LetterboxMeta {
    /// Compute the aspect-preserving mapping with centered padding.
    ///
    /// A zero `input_size` is treated as 1.
    pub fn compute(raw_w: u32, raw_h: u32, input_size: u32) -> Self {
        let input_size = input_size.max(1);
        let scale_x = input_size as f32 / raw_w.max(1) as f32;
        let scale_y = input_size as f32 / raw_h.max(1) as f32;
        let scale = scale_x.min(scale_y);

        let scaled_w = ((raw_w as f32 * scale).round() as u32).clamp(1, input_size);
        let scaled_h = ((raw_h as f32 * scale).round() as u32).clamp(1, input_size);

        Self {
            raw_width: raw_w,
            raw_height: raw_h,
            input_size,
            scale,
            pad_left: (input_size - scaled_w) / 2,
            pad_top: (input_size - scaled_h) / 2,
            scaled_width: scaled_w,
            scaled_height: scaled_h,
        }
    }

    /// Map a box from model space back to the raw frame, clamped to its bounds.
    pub fn map_box_to_raw(&self, bbox_inf: &BoundingBox) -> BoundingBox {
        let pad_x = self.pad_left as f32;
        let pad_y = self.pad_top as f32;
        let scale = if self.scale > f32::EPSILON { self.scale } else { 1.0 };

        BoundingBox::new(
            (bbox_inf.x1 - pad_x) / scale,
            (bbox_inf.y1 - pad_y) / scale,
            (bbox_inf.x2 - pad_x) / scale,
            (bbox_inf.y2 - pad_y) / scale,
        )
        .clamp(self.raw_width, self.raw_height)
    }

    /// Map a box from the raw frame into model space.
    pub fn map_box_to_input(&self, bbox_raw: &BoundingBox) -> BoundingBox {
        let pad_x = self.pad_left as f32;
        let pad_y = self.pad_top as f32;
        BoundingBox::new(
            bbox_raw.x1 * self.scale + pad_x,
            bbox_raw.y1 * self.scale + pad_y,
            bbox_raw.x2 * self.scale + pad_x,
            bbox_raw.y2 * self.scale + pad_y,
        )
    }

    /// Padding amounts (left, top, right, bottom).
    pub fn padding(&self) -> (u32, u32, u32, u32) {
        let pad_right = self.input_size - self.scaled_width - self.pad_left;
        let pad_bottom = self.input_size - self.scaled_height - self.pad_top;
        (self.pad_left, self.pad_top, pad_right, pad_bottom)
    }
}

/// Letterbox an image into a normalized NCHW buffer (`[1, 3, S, S]`, values in 0..=1).
pub fn letterbox(image: &DynamicImage, input_size: u32) -> VisionResult<(Vec<f32>, LetterboxMeta)> {
    let (raw_w, raw_h) = (image.width(), image.height());
    if raw_w == 0 || raw_h == 0 || input_size == 0 {
        return Err(VisionError::invalid_frame(format!(
            "cannot letterbox {raw_w}x{raw_h} into {input_size}"
        )));
    }

    let meta = LetterboxMeta::compute(raw_w, raw_h, input_size);
    let resized = image
        .resize_exact(meta.scaled_width, meta.scaled_height, FilterType::Triangle)
        .to_rgb8();

    let side = input_size as usize;
    let plane = side * side;
    let mut chw = vec![PADDING_VALUE as f32 / 255.0; 3 * plane];

    let (off_x, off_y) = (meta.pad_left as usize, meta.pad_top as usize);
    for (x, y, pixel) in resized.enumerate_pixels() {
        let idx = (off_y + y as usize) * side + off_x + x as usize;
        for c in 0..3 {
            chw[c * plane + idx] = pixel[c] as f32 / 255.0;
        }
    }

    Ok((chw, meta))
}
