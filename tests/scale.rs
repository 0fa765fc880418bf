use image::{Rgb, Rgb32FImage};
use vehicle_scan::detection::preprocess::{as_array, channel, resize, scaled_dimensions};
use vehicle_scan::detection::{FeatureBackend, HogBackend};
use vehicle_scan::FeatureParams;

fn textured_band(width: u32, height: u32) -> Rgb32FImage {
    Rgb32FImage::from_fn(width, height, |x, y| {
        let v = ((x / 4 + y / 4) % 2) as f32;
        Rgb([v, 1.0 - v, 0.5])
    })
}

fn block_grid(band: &Rgb32FImage, params: &FeatureParams) -> (usize, usize) {
    let pixels = as_array(band).unwrap();
    let blocks = HogBackend::new().gradient_blocks(channel(pixels, 0), params);
    let (ny, nx, _) = blocks.dim();
    (ny, nx)
}

#[test]
fn half_scale_halves_single_cell_block_grid() {
    let params = FeatureParams {
        cells_per_block: 1,
        ..Default::default()
    };
    let band = textured_band(256, 128);
    let (w, h) = scaled_dimensions(band.width(), band.height(), 2.0);
    let half = resize(&band, w, h);

    assert_eq!((w, h), (128, 64));
    assert_eq!(block_grid(&band, &params), (16, 32));
    assert_eq!(block_grid(&half, &params), (8, 16));
}

#[test]
fn half_scale_halves_cell_grid_for_wider_blocks() {
    // With 2-cell blocks the block grid is cells - 1 per axis, so it is the
    // cell grid that halves exactly.
    let params = FeatureParams::default();
    let band = textured_band(256, 128);
    let (w, h) = scaled_dimensions(band.width(), band.height(), 2.0);
    let half = resize(&band, w, h);

    let (ny, nx) = block_grid(&band, &params);
    let (hy, hx) = block_grid(&half, &params);
    assert_eq!((ny + 1, nx + 1), (2 * (hy + 1), 2 * (hx + 1)));
}
