use std::io::Cursor;

use html2docx::PageArea;
use html2docx::image::{DEFAULT_DPI, ImageInfo, PictureSize, image_size};
use html2docx::model::Emu;

/// Grayscale PNG, with a `pHYs` chunk when `dpi` is given.
fn generate_png(width: u32, height: u32, dpi: Option<u32>) -> Vec<u8> {
    let mut data = Vec::new();
    image::GrayImage::new(width, height)
        .write_to(&mut Cursor::new(&mut data), image::ImageFormat::Png)
        .unwrap();
    let Some(dpi) = dpi else {
        return data;
    };
    let ppm = (f64::from(dpi) / 0.0254 + 0.5) as u32;
    let mut body = Vec::new();
    body.extend_from_slice(b"pHYs");
    body.extend_from_slice(&ppm.to_be_bytes());
    body.extend_from_slice(&ppm.to_be_bytes());
    body.push(1);
    let mut chunk = Vec::new();
    chunk.extend_from_slice(&9u32.to_be_bytes());
    chunk.extend_from_slice(&body);
    chunk.extend_from_slice(&crc32fast::hash(&body).to_be_bytes());
    // signature (8) + IHDR chunk (25)
    data.splice(33..33, chunk);
    data
}

fn info(width: u32, height: u32, dpi: Option<u32>) -> ImageInfo {
    ImageInfo::from_bytes(&generate_png(width, height, dpi)).expect("generated image must decode")
}

fn inches_to_px(length: Emu, dpi: u32) -> u32 {
    (length.0 as f64 / Emu::PER_INCH as f64 * f64::from(dpi)).ceil() as u32
}

fn px_to_emu(px: u32) -> Emu {
    Emu((f64::from(px) * Emu::PER_INCH as f64 / f64::from(DEFAULT_DPI)).ceil() as i64)
}

fn size(width: Option<Emu>, height: Option<Emu>) -> PictureSize {
    PictureSize { width, height }
}

#[test]
fn embedded_resolution_is_read() {
    let image = info(3, 2, Some(300));
    assert_eq!((image.px_width, image.px_height), (3, 2));
    assert_eq!((image.horz_dpi, image.vert_dpi), (300, 300));
    assert_eq!(info(3, 2, None).horz_dpi, DEFAULT_DPI);
}

#[test]
fn one_px() {
    let page = PageArea::default();
    let side = px_to_emu(1);
    assert_eq!(
        image_size(&info(1, 1, None), Some(1), Some(1), &page),
        size(Some(side), Some(side))
    );
}

#[test]
fn upscale() {
    let page = PageArea::default();
    let side = px_to_emu(2);
    assert_eq!(
        image_size(&info(1, 1, None), Some(2), Some(2), &page),
        size(Some(side), Some(side))
    );
}

#[test]
fn downscale() {
    let page = PageArea::default();
    let side = px_to_emu(1);
    assert_eq!(
        image_size(&info(2, 2, None), Some(1), Some(1), &page),
        size(Some(side), Some(side))
    );
}

#[test]
fn image_larger_than_usable_width() {
    let page = PageArea::default();
    let image = info(inches_to_px(page.usable_width, DEFAULT_DPI) + 1, 1, None);
    assert_eq!(
        image_size(&image, None, None, &page),
        size(Some(page.usable_width), None)
    );
}

#[test]
fn image_taller_than_usable_height() {
    let page = PageArea::default();
    let image = info(1, inches_to_px(page.usable_height, DEFAULT_DPI) + 1, None);
    assert_eq!(
        image_size(&image, None, None, &page),
        size(None, Some(page.usable_height))
    );
}

#[test]
fn requested_width_larger_than_usable_width() {
    let page = PageArea::default();
    let width_px = inches_to_px(page.usable_width, DEFAULT_DPI) + 1;
    assert_eq!(
        image_size(&info(100, 1, None), Some(width_px), None, &page),
        size(Some(page.usable_width), None)
    );
}

#[test]
fn requested_height_larger_than_usable_height() {
    let page = PageArea::default();
    let height_px = inches_to_px(page.usable_height, DEFAULT_DPI) + 1;
    assert_eq!(
        image_size(&info(1, 100, None), None, Some(height_px), &page),
        size(None, Some(page.usable_height))
    );
}

#[test]
fn height_fit_would_exceed_width() {
    let page = PageArea::default();
    let height_px = inches_to_px(page.usable_height, DEFAULT_DPI);
    assert_eq!(
        image_size(&info(1, 1, None), None, Some(height_px), &page),
        size(Some(page.usable_width), None)
    );
}

#[test]
fn width_fit_would_exceed_height() {
    let page = PageArea::default();
    let width_px = inches_to_px(page.usable_width, DEFAULT_DPI);
    assert_eq!(
        image_size(&info(1, 2, None), Some(width_px), None, &page),
        size(None, Some(page.usable_height))
    );
}

#[test]
fn natural_size_uses_embedded_dpi_for_width() {
    let page = PageArea::default();
    let image = info(inches_to_px(page.usable_width, 300), 1, Some(300));
    assert_eq!(image_size(&image, None, None, &page), PictureSize::default());
}

#[test]
fn natural_size_uses_embedded_dpi_for_height() {
    let page = PageArea::default();
    let image = info(1, inches_to_px(page.usable_height, 300), Some(300));
    assert_eq!(image_size(&image, None, None, &page), PictureSize::default());
}

#[test]
fn explicit_width_ignores_embedded_dpi() {
    let page = PageArea::default();
    let one_inch = Emu::from_inches(1.0);
    let width_px = inches_to_px(one_inch, DEFAULT_DPI);
    let image = info(width_px, 1, Some(300));
    assert_eq!(
        image_size(&image, Some(width_px), None, &page),
        size(Some(one_inch), None)
    );
}

#[test]
fn explicit_height_ignores_embedded_dpi() {
    let page = PageArea::default();
    let one_inch = Emu::from_inches(1.0);
    let height_px = inches_to_px(one_inch, DEFAULT_DPI);
    let image = info(1, height_px, Some(300));
    assert_eq!(
        image_size(&image, None, Some(height_px), &page),
        size(None, Some(one_inch))
    );
}

#[test]
fn square_2000px_at_72_dpi_fills_the_width() {
    let page = PageArea::default();
    let image = ImageInfo {
        px_width: 2000,
        px_height: 2000,
        ..info(1, 1, None)
    };
    assert_eq!(
        image_size(&image, None, None, &page),
        size(Some(Emu::from_inches(5.8)), None)
    );
}

#[test]
fn single_constraint_keeps_aspect_ratio() {
    let image = info(200, 100, None);
    let (w, h) = image.scaled(size(Some(Emu::from_inches(1.0)), None));
    assert_eq!(w, Emu::from_inches(1.0));
    assert_eq!(h, Emu(Emu::PER_INCH / 2));
}
