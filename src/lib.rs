mod builder;
mod convert;
mod docx;
mod error;
pub mod html;
pub mod image;
pub mod model;
mod options;
mod style;

pub use builder::{DocumentBuilder, ParagraphHandle, RunHandle};
pub use error::Error;
pub use image::ImageResolver;
pub use model::Document;
pub use options::{ConvertOptions, FetchOptions, MAX_IMAGE_SIZE, PageArea};

use std::path::Path;
use std::time::Instant;

/// Build the document model for `html` without serializing it.
pub fn html_to_document(
    html: &str,
    title: &str,
    options: &ConvertOptions,
    images: &ImageResolver,
) -> Result<Document, Error> {
    convert::convert(html, title, &options.page, images)
}

/// Serialize a document model into `.docx` bytes.
pub fn write_docx(doc: &Document) -> Result<Vec<u8>, Error> {
    docx::write(doc)
}

/// Convert with default options, fetching remote images over HTTP.
pub fn convert_html_to_docx(html: &str, title: &str) -> Result<Vec<u8>, Error> {
    let options = ConvertOptions::default();
    let images = ImageResolver::new(options.fetch.clone())?;
    convert_html_to_docx_with(html, title, &options, &images)
}

pub fn convert_html_to_docx_with(
    html: &str,
    title: &str,
    options: &ConvertOptions,
    images: &ImageResolver,
) -> Result<Vec<u8>, Error> {
    let t0 = Instant::now();

    let doc = html_to_document(html, title, options, images)?;
    let t_convert = t0.elapsed();

    let bytes = write_docx(&doc)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: convert={:.1}ms, serialize={:.1}ms, total={:.1}ms (output {} bytes)",
        t_convert.as_secs_f64() * 1000.0,
        (t_total - t_convert).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(bytes)
}

/// Read an HTML file and write the converted package to `output`.
pub fn convert_html_file(
    input: &Path,
    output: &Path,
    title: &str,
    options: &ConvertOptions,
    images: &ImageResolver,
) -> Result<(), Error> {
    let html = std::fs::read_to_string(input)?;
    let bytes = convert_html_to_docx_with(&html, title, options, images)?;
    std::fs::write(output, &bytes)?;
    log::info!("Wrote {}", output.display());
    Ok(())
}
