use image::{Rgb, RgbImage};

use super::glyphs::{glyph, GLYPH_HEIGHT, GLYPH_WIDTH};
use crate::domain::{detection::BoundingBox, violation::Annotation};

pub fn annotate(image: &mut RgbImage, annotations: &[Annotation]) {
    for a in annotations {
        let color = Rgb(a.color);
        draw_rect_stroke(image, a.rect, a.stroke, color);
        draw_text(image, &a.text, a.text_origin, a.text_scale, color);
    }
}

/// Fills `[x0, x1) x [y0, y1)`, silently clipped to the image.
fn fill(image: &mut RgbImage, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
    let x0 = x0.max(0);
    let y0 = y0.max(0);
    let x1 = x1.min(image.width() as i64);
    let y1 = y1.min(image.height() as i64);
    for y in y0..y1 {
        for x in x0..x1 {
            image.put_pixel(x as u32, y as u32, color);
        }
    }
}

/// Outline drawn inside the box so the stroke never covers pixels outside it.
pub fn draw_rect_stroke(image: &mut RgbImage, rect: BoundingBox, stroke: u32, color: Rgb<u8>) {
    let (x1, y1, x2, y2) = (rect.x1 as i64, rect.y1 as i64, rect.x2 as i64, rect.y2 as i64);
    let s = stroke.max(1) as i64;
    fill(image, x1, y1, x2, y1 + s, color);
    fill(image, x1, y2 - s, x2, y2, color);
    fill(image, x1, y1, x1 + s, y2, color);
    fill(image, x2 - s, y1, x2, y2, color);
}

/// Pixel size of one font dot for a Hershey-style scale factor.
pub fn dot_size(scale: f32) -> u32 {
    (scale * 3.0).round().max(1.0) as u32
}

/// Draws `text` with its baseline's left end at `origin`. Unsupported characters are skipped.
pub fn draw_text(image: &mut RgbImage, text: &str, origin: (i32, i32), scale: f32, color: Rgb<u8>) {
    let dot = dot_size(scale) as i64;
    let top = origin.1 as i64 - GLYPH_HEIGHT as i64 * dot;
    let mut pen_x = origin.0 as i64;

    for c in text.chars() {
        let Some(rows) = glyph(c) else { continue };
        for (r, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0 {
                    let x = pen_x + col as i64 * dot;
                    let y = top + r as i64 * dot;
                    fill(image, x, y, x + dot, y + dot, color);
                }
            }
        }
        pen_x += (GLYPH_WIDTH as i64 + 1) * dot;
    }
}
