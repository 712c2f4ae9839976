//! End-to-end scenarios combining core values with transforms.

use raster_core::{ColorSpace, ImageValue, Metadata, Pixels, StorageType};
use raster_ops::{
    arith::{arithmetic, ArithOp, Operand},
    filter::{convolve, Kernel},
    geometry::{take2, take_rows},
    linearize::{colorize, linearize},
    reflect::{reflect, Side},
};

fn gray(rows: &[Vec<f64>]) -> ImageValue {
    ImageValue::from_matrix(rows, ColorSpace::Grayscale).unwrap()
}

#[test]
fn add_half_to_two_by_three_grayscale() {
    let img = gray(&[vec![0.0, 0.5, 0.2], vec![1.0, 0.1, 0.3]]);
    let out = arithmetic(&img, ArithOp::Add, &[Operand::Number(0.5)]).unwrap();
    assert_eq!(
        out.pixels().to_real_vec(),
        vec![0.5, 1.0, 0.7, 1.0, 0.6, 0.8]
    );
    // The input value is untouched.
    assert_eq!(img.pixels().to_real_vec()[0], 0.0);
}

#[test]
fn linearize_matrix_scenario() {
    let (ranks, n) = linearize(&[1.3, 2.1, 1.5, 1.3, 1.3, 2.1]);
    assert_eq!(n, 3);
    assert_eq!(ranks, vec![0, 2, 1, 0, 0, 2]);
}

#[test]
fn colorize_needs_exactly_distinct_count_colors() {
    let values = vec![vec![1.3, 2.1, 1.5], vec![1.3, 1.3, 2.1], vec![1.3, 2.1, 1.5]];
    let palette = [[0.1, 0.1, 0.1], [0.5, 0.5, 0.5], [0.9, 0.9, 0.9]];
    let img = colorize(&values, &palette).unwrap();
    assert_eq!(img.dimensions(), (3, 3));
    // Equal inputs share a color.
    assert_eq!(img.pixels().sample(0, 0), img.pixels().sample(1, 1));
    // Distinct inputs never collide.
    assert_ne!(img.pixels().sample(0, 0), img.pixels().sample(0, 1));
}

#[test]
fn decoded_image_through_crop_convolve_and_encode() {
    // A decoder hands over a 4x4 RGB byte buffer.
    let bytes: Vec<u8> = (0..4 * 4 * 3).map(|i| (i * 5) as u8).collect();
    let pixels = Pixels::new(raster_core::PixelBuffer::Byte(bytes), 4, 4, 3).unwrap();
    let mut meta = Metadata::new();
    meta.insert("Make".into(), "TestCam".into());
    let img = ImageValue::from_decoded(pixels, meta.clone()).unwrap();
    assert_eq!(img.color_space(), ColorSpace::Rgb);

    let cropped = take2(&img, (1, 2), (2, 3));
    assert_eq!(cropped.dimensions(), (2, 2));
    assert_eq!(cropped.metadata(), &meta);

    let kernel = Kernel::from_matrix(&[vec![0.25; 2], vec![0.25; 2]]).unwrap();
    let soft = convolve(&cropped, &kernel);
    assert_eq!(soft.storage_type(), StorageType::Real);
    assert_eq!(soft.color_space(), ColorSpace::Rgb);

    // Small image: the display encoding is magnified, the value is not.
    let form = soft.encodable_form();
    assert_eq!((form.width, form.height), (128, 128));
    assert_eq!(soft.dimensions(), (2, 2));
}

#[test]
fn reflection_round_trips_compose_with_take() {
    let img = gray(&[
        vec![0.0, 0.1, 0.2, 0.3],
        vec![0.4, 0.5, 0.6, 0.7],
        vec![0.8, 0.9, 1.0, 0.0],
    ]);
    // Taking the last row then flipping equals flipping then taking the
    // first row.
    let a = reflect(&take_rows(&img, -1), Side::Top, Side::Bottom);
    let b = take_rows(&reflect(&img, Side::Top, Side::Bottom), 1);
    assert_eq!(a, b);
}

#[test]
fn grayscale_conversion_is_stable_under_repeat() {
    let img = ImageValue::from_tensor(
        &[vec![vec![0.9, 0.4, 0.1], vec![0.2, 0.7, 0.6]]],
        ColorSpace::Rgb,
    )
    .unwrap();
    let once = img.grayscale();
    let twice = once.grayscale();
    assert_eq!(once, twice);
}
