use image::{GrayImage, Luma, Rgb, Rgb32FImage, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use super::types::{BoundingBox, Heatmap};

pub const BOX_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const BOX_THICKNESS: i32 = 6;

/// 8-bit copy of a `[0, 1]` image.
pub fn to_rgb8(image: &Rgb32FImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        Rgb([to_u8(r), to_u8(g), to_u8(b)])
    })
}

fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Draw each box as a `BOX_THICKNESS`-pixel outline growing inward.
pub fn draw_boxes(image: &mut RgbImage, boxes: &[BoundingBox], color: Rgb<u8>) {
    for b in boxes {
        let b = b.normalized();
        for inset in 0..BOX_THICKNESS {
            let w = b.width() - 2 * inset;
            let h = b.height() - 2 * inset;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(b.x1 + inset, b.y1 + inset).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(image, rect, color);
        }
    }
}

/// Grayscale rendering of a heatmap, stretched so its maximum maps to 255.
pub fn heatmap_to_gray(heat: &Heatmap) -> GrayImage {
    let (h, w) = heat.dim();
    let max = heat.iter().copied().max().unwrap_or(0).max(1) as f32;
    GrayImage::from_fn(w as u32, h as u32, |x, y| {
        let v = heat[[y as usize, x as usize]] as f32 * 255.0 / max;
        Luma([v.round() as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outline_is_drawn_inside_the_box() {
        let mut img = RgbImage::new(40, 40);
        draw_boxes(&mut img, &[BoundingBox::new(5, 5, 35, 35)], BOX_COLOR);
        assert_eq!(*img.get_pixel(5, 5), BOX_COLOR);
        assert_eq!(*img.get_pixel(10, 20), BOX_COLOR);
        assert_eq!(*img.get_pixel(11, 20), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(4, 4), Rgb([0, 0, 0]));
    }

    #[test]
    fn heatmap_is_stretched_to_full_range() {
        let mut heat = Heatmap::zeros((2, 2));
        heat[[0, 1]] = 4;
        heat[[1, 1]] = 2;
        let gray = heatmap_to_gray(&heat);
        assert_eq!(gray.get_pixel(1, 0).0, [255]);
        assert_eq!(gray.get_pixel(1, 1).0, [128]);
        assert_eq!(gray.get_pixel(0, 0).0, [0]);
    }
}
