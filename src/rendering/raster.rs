//! Rasterizer for display lists
//!
//! Commands are in CSS pixels; the canvas multiplies every coordinate by the
//! capture scale. Glyphs are drawn as filled cells: capitals and digits fill
//! the cell, lowercase letters the lower two thirds, punctuation a dot.

use crate::rendering::layout::{line_height, GLYPH_HEIGHT, GLYPH_WIDTH};
use crate::rendering::paint::{PaintCommand, Rgba};
use image::RgbaImage;

struct Canvas {
    img: RgbaImage,
    scale: u32,
}

impl Canvas {
    fn new(width: u32, height: u32, scale: u32, background: Rgba) -> Self {
        let (r, g, b, a) = background;
        Self {
            img: RgbaImage::from_pixel(width * scale, height * scale, image::Rgba([r, g, b, a])),
            scale,
        }
    }

    /// Fill a rectangle given in CSS pixels, clipped to the canvas.
    fn fill(&mut self, x: i64, y: i64, width: u64, height: u64, rgba: Rgba) {
        let s = i64::from(self.scale);
        let x0 = (x * s).max(0);
        let y0 = (y * s).max(0);
        let x1 = ((x + width as i64) * s).min(i64::from(self.img.width()));
        let y1 = ((y + height as i64) * s).min(i64::from(self.img.height()));
        let (r, g, b, a) = rgba;
        for py in y0..y1 {
            for px in x0..x1 {
                self.img.put_pixel(px as u32, py as u32, image::Rgba([r, g, b, a]));
            }
        }
    }

    fn stroke(&mut self, x: i64, y: i64, width: u64, height: u64, rgba: Rgba) {
        if width == 0 || height == 0 {
            return;
        }
        self.fill(x, y, width, 1, rgba);
        self.fill(x, y + height as i64 - 1, width, 1, rgba);
        self.fill(x, y, 1, height, rgba);
        self.fill(x + width as i64 - 1, y, 1, height, rgba);
    }

    fn text(&mut self, x: i64, y: i64, text: &str, scale: u32, rgba: Rgba) {
        let cell_w = i64::from(GLYPH_WIDTH * scale);
        let row_h = i64::from(line_height(scale));
        let glyph_w = u64::from((GLYPH_WIDTH - 2) * scale);
        let glyph_h = u64::from((GLYPH_HEIGHT - 2) * scale);
        let inset = i64::from(scale);

        for (row, line) in text.lines().enumerate() {
            let gy = y + row as i64 * row_h + inset;
            for (col, ch) in line.chars().enumerate() {
                if ch.is_whitespace() {
                    continue;
                }
                let gx = x + col as i64 * cell_w + inset;
                if ch.is_lowercase() {
                    let top = glyph_h / 3;
                    self.fill(gx, gy + top as i64, glyph_w, glyph_h - top, rgba);
                } else if ch.is_alphanumeric() {
                    self.fill(gx, gy, glyph_w, glyph_h, rgba);
                } else {
                    let dot = u64::from(2 * scale);
                    self.fill(gx, gy + (glyph_h - dot) as i64, dot, dot, rgba);
                }
            }
        }
    }

    fn paint(&mut self, cmd: &PaintCommand) {
        match cmd {
            PaintCommand::SolidRect { x, y, width, height, rgba } => {
                self.fill(i64::from(*x), i64::from(*y), u64::from(*width), u64::from(*height), *rgba)
            }
            PaintCommand::StrokeRect { x, y, width, height, rgba } => {
                self.stroke(i64::from(*x), i64::from(*y), u64::from(*width), u64::from(*height), *rgba)
            }
            PaintCommand::Text { x, y, text, scale, rgba } => {
                self.text(i64::from(*x), i64::from(*y), text, *scale, *rgba)
            }
        }
    }
}

/// Rasterize `commands` onto a `width` x `height` CSS-pixel surface.
///
/// The returned bitmap is `width * scale` by `height * scale` pixels and
/// starts filled with `background`. Callers bound the dimensions first.
pub fn rasterize(
    commands: &[PaintCommand],
    width: u32,
    height: u32,
    scale: u32,
    background: Rgba,
) -> RgbaImage {
    let mut canvas = Canvas::new(width, height, scale, background);
    for cmd in commands {
        canvas.paint(cmd);
    }
    canvas.img
}

#[cfg(test)]
mod tests {
    use super::*;

    const BG: Rgba = (10, 10, 10, 255);
    const FG: Rgba = (245, 245, 245, 255);

    #[test]
    fn canvas_is_scaled_and_filled() {
        let img = rasterize(&[], 16, 8, 2, BG);
        assert_eq!(img.dimensions(), (32, 16));
        assert!(img.pixels().all(|p| p.0 == [10, 10, 10, 255]));
    }

    #[test]
    fn solid_rect_is_clipped_to_canvas() {
        let cmd = PaintCommand::SolidRect {
            x: -2,
            y: 4,
            width: 100,
            height: 100,
            rgba: FG,
        };
        let img = rasterize(&[cmd], 10, 10, 1, BG);
        assert_eq!(img.get_pixel(0, 4).0, [245, 245, 245, 255]);
        assert_eq!(img.get_pixel(9, 9).0, [245, 245, 245, 255]);
        assert_eq!(img.get_pixel(0, 3).0, [10, 10, 10, 255]);
    }

    #[test]
    fn text_paints_glyph_cells() {
        let cmd = PaintCommand::Text {
            x: 0,
            y: 0,
            text: "A".into(),
            scale: 1,
            rgba: FG,
        };
        let img = rasterize(&[cmd], 16, 16, 1, BG);
        // cell inset by one pixel
        assert_eq!(img.get_pixel(0, 0).0, [10, 10, 10, 255]);
        assert_eq!(img.get_pixel(1, 1).0, [245, 245, 245, 255]);
        assert_eq!(img.get_pixel(6, 6).0, [245, 245, 245, 255]);
        assert_eq!(img.get_pixel(7, 7).0, [10, 10, 10, 255]);
    }

    #[test]
    fn stroke_leaves_interior_untouched() {
        let cmd = PaintCommand::StrokeRect {
            x: 0,
            y: 0,
            width: 5,
            height: 5,
            rgba: FG,
        };
        let img = rasterize(&[cmd], 5, 5, 1, BG);
        assert_eq!(img.get_pixel(0, 2).0, [245, 245, 245, 255]);
        assert_eq!(img.get_pixel(4, 4).0, [245, 245, 245, 255]);
        assert_eq!(img.get_pixel(2, 2).0, [10, 10, 10, 255]);
    }
}
