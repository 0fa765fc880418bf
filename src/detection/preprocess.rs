use image::{imageops, DynamicImage, Rgb, Rgb32FImage};
use ndarray::{ArrayView2, ArrayView3, Axis};

use crate::error::{DetectError, Result};

/// RGB image with every sample guaranteed to lie in `[0, 1]`.
///
/// All detection stages work on this type only; conversion from encoded
/// input happens once, at pipeline entry.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    inner: Rgb32FImage,
}

impl NormalizedImage {
    /// Normalize a decoded image.
    ///
    /// 8-bit RGB is rescaled by 1/255, floating-point RGB passes through
    /// (after a range check). Other layouts are rejected.
    pub fn from_dynamic(image: &DynamicImage) -> Result<Self> {
        match image {
            DynamicImage::ImageRgb8(rgb) => {
                check_dimensions(rgb.width(), rgb.height())?;
                let data = rgb.as_raw().iter().map(|&v| v as f32 / 255.0).collect();
                Self::from_raw(rgb.width(), rgb.height(), data)
            }
            DynamicImage::ImageRgb32F(rgb) => {
                check_dimensions(rgb.width(), rgb.height())?;
                check_range(rgb.as_raw())?;
                Ok(Self { inner: rgb.clone() })
            }
            other => Err(DetectError::InvalidImage(format!(
                "expected 3-channel RGB (8-bit or f32), got {:?}",
                other.color()
            ))),
        }
    }

    /// Normalize an 8-bit `(height, width, 3)` array.
    pub fn from_u8(pixels: ArrayView3<'_, u8>) -> Result<Self> {
        let (h, w) = check_shape(pixels.shape())?;
        let data = pixels.iter().map(|&v| v as f32 / 255.0).collect();
        Self::from_raw(w, h, data)
    }

    /// Wrap a floating-point `(height, width, 3)` array already in `[0, 1]`.
    pub fn from_f32(pixels: ArrayView3<'_, f32>) -> Result<Self> {
        let (h, w) = check_shape(pixels.shape())?;
        let data: Vec<f32> = pixels.iter().copied().collect();
        check_range(&data)?;
        Self::from_raw(w, h, data)
    }

    fn from_raw(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        Rgb32FImage::from_raw(width, height, data)
            .map(|inner| Self { inner })
            .ok_or_else(|| DetectError::InvalidImage("pixel buffer size mismatch".to_string()))
    }

    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    pub fn as_rgb(&self) -> &Rgb32FImage {
        &self.inner
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(DetectError::InvalidImage(format!(
            "dimensions must be positive, got {width}x{height}"
        )));
    }
    Ok(())
}

fn check_shape(shape: &[usize]) -> Result<(u32, u32)> {
    if shape.len() != 3 || shape[2] != 3 {
        return Err(DetectError::InvalidImage(format!(
            "expected shape (height, width, 3), got {shape:?}"
        )));
    }
    let (h, w) = (shape[0] as u32, shape[1] as u32);
    check_dimensions(w, h)?;
    Ok((h, w))
}

fn check_range(data: &[f32]) -> Result<()> {
    match data.iter().find(|v| !(0.0..=1.0).contains(*v)) {
        Some(v) => Err(DetectError::InvalidImage(format!(
            "float samples must lie in [0, 1], found {v}"
        ))),
        None => Ok(()),
    }
}

/// Fixed RGB to YCrCb conversion. The classifier is trained on this color
/// space, so it is not configurable.
pub fn rgb_to_ycrcb(image: &Rgb32FImage) -> Rgb32FImage {
    let mut out = image.clone();
    for px in out.pixels_mut() {
        let [r, g, b] = px.0;
        let y = 0.299 * r + 0.587 * g + 0.114 * b;
        let cr = (r - y) * 0.713 + 0.5;
        let cb = (b - y) * 0.564 + 0.5;
        *px = Rgb([y, cr, cb]);
    }
    out
}

/// Copy rows `[y_start, y_stop)` out of `image`.
pub fn crop_rows(image: &Rgb32FImage, y_start: u32, y_stop: u32) -> Rgb32FImage {
    imageops::crop_imm(image, 0, y_start, image.width(), y_stop - y_start).to_image()
}

/// Target size when shrinking `(width, height)` by `scale`, truncated.
pub fn scaled_dimensions(width: u32, height: u32, scale: f32) -> (u32, u32) {
    (
        (width as f32 / scale) as u32,
        (height as f32 / scale) as u32,
    )
}

/// Bilinear resize; returns a plain copy when the size already matches.
pub fn resize(image: &Rgb32FImage, width: u32, height: u32) -> Rgb32FImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, imageops::FilterType::Triangle)
}

/// View an RGB buffer as a `(height, width, 3)` array.
pub fn as_array(image: &Rgb32FImage) -> Result<ArrayView3<'_, f32>> {
    let shape = (image.height() as usize, image.width() as usize, 3);
    ArrayView3::from_shape(shape, image.as_raw().as_slice())
        .map_err(|e| DetectError::InvalidImage(format!("pixel buffer layout: {e}")))
}

/// Single channel of an RGB array view.
pub fn channel(pixels: ArrayView3<'_, f32>, index: usize) -> ArrayView2<'_, f32> {
    pixels.index_axis_move(Axis(2), index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use ndarray::Array3;

    #[test]
    fn u8_input_is_rescaled() {
        let rgb = RgbImage::from_pixel(4, 2, image::Rgb([255, 0, 51]));
        let img = NormalizedImage::from_dynamic(&DynamicImage::ImageRgb8(rgb)).unwrap();
        let px = img.as_rgb().get_pixel(3, 1);
        assert_eq!(px.0, [1.0, 0.0, 0.2]);
    }

    #[test]
    fn float_input_passes_through() {
        let pixels = Array3::<f32>::from_elem((2, 3, 3), 0.25);
        let img = NormalizedImage::from_f32(pixels.view()).unwrap();
        assert_eq!((img.width(), img.height()), (3, 2));
        assert!(img.as_rgb().as_raw().iter().all(|&v| v == 0.25));
    }

    #[test]
    fn wrong_channel_count_is_rejected() {
        let pixels = Array3::<u8>::zeros((4, 4, 4));
        assert!(matches!(
            NormalizedImage::from_u8(pixels.view()),
            Err(DetectError::InvalidImage(_))
        ));
        let gray = DynamicImage::new_luma8(4, 4);
        assert!(NormalizedImage::from_dynamic(&gray).is_err());
    }

    #[test]
    fn empty_and_out_of_range_inputs_are_rejected() {
        let empty = Array3::<u8>::zeros((0, 4, 3));
        assert!(NormalizedImage::from_u8(empty.view()).is_err());
        let hot = Array3::<f32>::from_elem((2, 2, 3), 1.5);
        assert!(NormalizedImage::from_f32(hot.view()).is_err());
    }

    #[test]
    fn gray_maps_to_neutral_chroma() {
        let img = Rgb32FImage::from_pixel(1, 1, Rgb([0.4, 0.4, 0.4]));
        let [y, cr, cb] = rgb_to_ycrcb(&img).get_pixel(0, 0).0;
        assert!((y - 0.4).abs() < 1e-6);
        assert!((cr - 0.5).abs() < 1e-6);
        assert!((cb - 0.5).abs() < 1e-6);
    }

    #[test]
    fn scaled_dimensions_truncate() {
        assert_eq!(scaled_dimensions(1280, 100, 2.0), (640, 50));
        assert_eq!(scaled_dimensions(101, 33, 1.5), (67, 22));
    }

    #[test]
    fn array_view_matches_pixels() {
        let mut img = Rgb32FImage::new(3, 2);
        img.put_pixel(2, 1, Rgb([0.1, 0.2, 0.3]));
        let view = as_array(&img).unwrap();
        assert_eq!(view.shape(), &[2, 3, 3]);
        assert_eq!(view[[1, 2, 1]], 0.2);
        assert_eq!(channel(view, 2)[[1, 2]], 0.3);
    }
}
