use ndarray::Array3;

/// Black `(height, width, 3)` image with a white axis-aligned rectangle
/// covering `[x1, x2) × [y1, y2)`.
pub fn white_rect_u8(
    width: usize,
    height: usize,
    (x1, y1, x2, y2): (usize, usize, usize, usize),
) -> Array3<u8> {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    assert!(x2 <= width && y2 <= height, "rectangle must fit in the image");

    let mut img = Array3::<u8>::zeros((height, width, 3));
    for y in y1..y2 {
        for x in x1..x2 {
            for c in 0..3 {
                img[[y, x, c]] = 255;
            }
        }
    }
    img
}
