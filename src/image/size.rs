use std::io::Cursor;

use image::ImageReader;

use crate::model::{Emu, ImageFormat};
use crate::options::PageArea;

/// Resolution assumed for explicit pixel sizes and for images that carry none.
pub const DEFAULT_DPI: u32 = 72;

/// What the sizing rules need to know about a decoded raster image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub px_width: u32,
    pub px_height: u32,
    pub horz_dpi: u32,
    pub vert_dpi: u32,
}

impl ImageInfo {
    /// Sniff the format, read the pixel size and the embedded resolution.
    /// Returns `None` for anything that is not a PNG, JPEG, GIF or BMP image
    /// with a readable, non-empty header.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let format = match image::guess_format(data).ok()? {
            image::ImageFormat::Png => ImageFormat::Png,
            image::ImageFormat::Jpeg => ImageFormat::Jpeg,
            image::ImageFormat::Gif => ImageFormat::Gif,
            image::ImageFormat::Bmp => ImageFormat::Bmp,
            _ => return None,
        };
        let (px_width, px_height) = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .ok()?
            .into_dimensions()
            .ok()?;
        if px_width == 0 || px_height == 0 {
            return None;
        }
        let (horz_dpi, vert_dpi) = match format {
            ImageFormat::Png => png_dpi(data),
            ImageFormat::Jpeg => jpeg_dpi(data),
            ImageFormat::Bmp => bmp_dpi(data),
            ImageFormat::Gif => (DEFAULT_DPI, DEFAULT_DPI),
        };
        Some(ImageInfo {
            format,
            px_width,
            px_height,
            horz_dpi: non_zero_dpi(horz_dpi),
            vert_dpi: non_zero_dpi(vert_dpi),
        })
    }

    /// Physical size at the embedded resolution.
    pub fn native_size(&self) -> (Emu, Emu) {
        (
            Emu::from_inches(f64::from(self.px_width) / f64::from(self.horz_dpi)),
            Emu::from_inches(f64::from(self.px_height) / f64::from(self.vert_dpi)),
        )
    }

    /// Final drawing extent. A missing dimension is scaled from the native
    /// size so the aspect ratio is kept.
    pub fn scaled(&self, size: PictureSize) -> (Emu, Emu) {
        let (native_w, native_h) = self.native_size();
        match (size.width, size.height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => {
                let factor = w.0 as f64 / native_w.0 as f64;
                (w, Emu((native_h.0 as f64 * factor).round() as i64))
            }
            (None, Some(h)) => {
                let factor = h.0 as f64 / native_h.0 as f64;
                (Emu((native_w.0 as f64 * factor).round() as i64), h)
            }
            (None, None) => (native_w, native_h),
        }
    }
}

fn non_zero_dpi(dpi: u32) -> u32 {
    if dpi == 0 { DEFAULT_DPI } else { dpi }
}

fn per_meter_to_dpi(ppm: u32) -> u32 {
    (f64::from(ppm) * 0.0254).round() as u32
}

/// `pHYs` with unit 1 is pixels per meter; anything else means unknown.
fn png_dpi(data: &[u8]) -> (u32, u32) {
    let mut pos = 8;
    while pos + 8 <= data.len() {
        let len = u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
        let kind = &data[pos + 4..pos + 8];
        let body = pos + 8;
        if kind == b"pHYs" && len >= 9 && body + 9 <= data.len() {
            let x = u32::from_be_bytes([data[body], data[body + 1], data[body + 2], data[body + 3]]);
            let y = u32::from_be_bytes([
                data[body + 4],
                data[body + 5],
                data[body + 6],
                data[body + 7],
            ]);
            if data[body + 8] == 1 {
                return (per_meter_to_dpi(x), per_meter_to_dpi(y));
            }
            break;
        }
        if kind == b"IDAT" || kind == b"IEND" {
            break;
        }
        pos = body.saturating_add(len).saturating_add(4);
    }
    (DEFAULT_DPI, DEFAULT_DPI)
}

/// Density from the JFIF APP0 segment: unit 1 is dots per inch, unit 2 dots
/// per centimeter.
fn jpeg_dpi(data: &[u8]) -> (u32, u32) {
    let mut i = 2;
    while i + 4 <= data.len() {
        if data[i] != 0xFF {
            break;
        }
        let marker = data[i + 1];
        // start of scan: no more headers
        if marker == 0xDA || marker == 0xD9 {
            break;
        }
        let len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        let seg = i + 4;
        if marker == 0xE0 && seg + 12 <= data.len() && &data[seg..seg + 5] == b"JFIF\0" {
            let units = data[seg + 7];
            let x = u32::from(u16::from_be_bytes([data[seg + 8], data[seg + 9]]));
            let y = u32::from(u16::from_be_bytes([data[seg + 10], data[seg + 11]]));
            return match units {
                1 => (x, y),
                2 => (
                    (f64::from(x) * 2.54).round() as u32,
                    (f64::from(y) * 2.54).round() as u32,
                ),
                _ => (DEFAULT_DPI, DEFAULT_DPI),
            };
        }
        i += 2 + len;
    }
    (DEFAULT_DPI, DEFAULT_DPI)
}

/// Pixels per meter from the info header; 0 means the bitmap default of 96.
fn bmp_dpi(data: &[u8]) -> (u32, u32) {
    let read = |at: usize| -> u32 {
        match data.get(at..at + 4) {
            Some(b) => i32::from_le_bytes([b[0], b[1], b[2], b[3]]).max(0) as u32,
            None => 0,
        }
    };
    let dpi = |ppm: u32| if ppm == 0 { 96 } else { per_meter_to_dpi(ppm) };
    (dpi(read(38)), dpi(read(42)))
}

/// Extent constraints for a picture. `None` leaves the dimension to be
/// derived from the other one (or from the image itself).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PictureSize {
    pub width: Option<Emu>,
    pub height: Option<Emu>,
}

/// Fit an image inside the usable page area.
///
/// Without an explicit pixel size a dimension is the image's pixel count at
/// its own resolution; an explicit pixel size is read at [`DEFAULT_DPI`].
/// An oversized image gets a single constraint so the consumer keeps the
/// aspect ratio. An image that fits keeps only the explicitly requested
/// dimensions.
pub fn image_size(
    info: &ImageInfo,
    width_px: Option<u32>,
    height_px: Option<u32>,
    page: &PageArea,
) -> PictureSize {
    let default_dpi = f64::from(DEFAULT_DPI);
    let height = match height_px {
        None => f64::from(info.px_height) / f64::from(info.vert_dpi),
        Some(px) => f64::from(px) / default_dpi,
    };
    let width = match width_px {
        None => f64::from(info.px_width) / f64::from(info.horz_dpi),
        Some(px) => f64::from(px) / default_dpi,
    };
    let height = Emu::from_inches(height);
    let width = Emu::from_inches(width);

    let px_width = f64::from(info.px_width);
    let px_height = f64::from(info.px_height);
    let max_width = page.usable_width;
    let max_height = page.usable_height;

    let mut size = PictureSize::default();
    if width > max_width {
        let new_height = (px_height / (px_width / max_width.0 as f64)).round_ties_even();
        if new_height > max_height.0 as f64 {
            size.height = Some(max_height);
        } else {
            size.width = Some(max_width);
        }
    } else if height > max_height {
        let new_width = (px_width / (px_height / max_height.0 as f64)).round_ties_even();
        if new_width > max_width.0 as f64 {
            size.width = Some(max_width);
        } else {
            size.height = Some(max_height);
        }
    } else {
        if width_px.is_some() {
            size.width = Some(width);
        }
        if height_px.is_some() {
            size.height = Some(height);
        }
    }
    size
}
