use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use html2docx::{ConvertOptions, ImageResolver};

#[derive(Parser)]
#[command(name = "html2docx", about = "Convert rich-text editor HTML to DOCX")]
struct Args {
    /// Input HTML file
    input: PathBuf,
    /// Output DOCX file (defaults to input with .docx extension)
    output: Option<PathBuf>,
    /// Document title (defaults to the input file name without extension)
    #[arg(long)]
    title: Option<String>,
    /// Timeout in seconds for each remote image request
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
    /// Largest accepted remote image, in bytes
    #[arg(long, value_name = "BYTES")]
    max_image_size: Option<u64>,
    /// Replace every remote image with the placeholder
    #[arg(long)]
    no_remote_images: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if !args.input.exists() {
        eprintln!("Error: file not found: {}", args.input.display());
        std::process::exit(1);
    }
    if !args.input.is_file() {
        eprintln!("Error: not a file: {}", args.input.display());
        std::process::exit(1);
    }

    let output = args
        .output
        .unwrap_or_else(|| args.input.with_extension("docx"));
    let title = args.title.unwrap_or_else(|| {
        args.input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    let mut options = ConvertOptions::default();
    if let Some(secs) = args.timeout {
        options.fetch.timeout = Duration::from_secs(secs);
    }
    if let Some(max) = args.max_image_size {
        options.fetch.max_image_size = max;
    }

    let images = if args.no_remote_images {
        ImageResolver::offline(options.fetch.clone())
    } else {
        match ImageResolver::new(options.fetch.clone()) {
            Ok(images) => images,
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    };

    if let Err(e) = html2docx::convert_html_file(&args.input, &output, &title, &options, &images) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
