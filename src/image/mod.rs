//! Image bytes resolution and page-fit sizing.
//!
//! [`ImageResolver::load`] never fails: every problem ends in [`PLACEHOLDER`].
//! [`image_size`] decides which extent constraints a picture gets so it stays
//! inside the usable page area.

mod fetch;
mod size;

pub use fetch::{
    FetchError, HttpTransport, ImageResolver, OfflineTransport, Sleeper, ThreadSleeper, Transport,
    load_inline_image,
};
pub use size::{DEFAULT_DPI, ImageInfo, PictureSize, image_size};

/// Bundled fallback picture, a 32x32 PNG without resolution metadata.
pub static PLACEHOLDER: &[u8] = include_bytes!("../../assets/image-broken.png");
