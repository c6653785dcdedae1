use std::fmt;
use std::io::Read;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::PLACEHOLDER;
use super::size::ImageInfo;
use crate::error::Error;
use crate::options::FetchOptions;

/// Why a single fetch attempt produced no bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connectivity problem (name resolution, refused connection); worth retrying.
    Transient(String),
    /// The server answered badly or the locator is unusable.
    Fatal(String),
    /// Declared or actual body size above the limit.
    TooLarge(u64),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transient(msg) => write!(f, "transient network error: {msg}"),
            FetchError::Fatal(msg) => write!(f, "{msg}"),
            FetchError::TooLarge(limit) => write!(f, "response larger than {limit} bytes"),
        }
    }
}

/// One request/response round trip for a remote image.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, max_bytes: u64) -> Result<Vec<u8>, FetchError>;
}

pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Refuses every remote locator.
pub struct OfflineTransport;

impl Transport for OfflineTransport {
    fn get(&self, url: &str, _max_bytes: u64) -> Result<Vec<u8>, FetchError> {
        Err(FetchError::Fatal(format!("remote images disabled, not fetching {url}")))
    }
}

pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(options: &FetchOptions) -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(options.connect_timeout)
            .timeout(options.timeout)
            .user_agent(options.user_agent.clone())
            .build()?;
        Ok(HttpTransport { client })
    }
}

fn classify(err: reqwest::Error) -> FetchError {
    if err.is_connect() {
        FetchError::Transient(err.to_string())
    } else {
        FetchError::Fatal(err.to_string())
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, max_bytes: u64) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(classify)?;

        if let Some(len) = response.content_length()
            && len > max_bytes
        {
            return Err(FetchError::TooLarge(max_bytes));
        }

        // One byte past the limit tells an oversized body from one that fits exactly.
        let mut data = Vec::new();
        response
            .take(max_bytes + 1)
            .read_to_end(&mut data)
            .map_err(|e| FetchError::Fatal(format!("reading body: {e}")))?;
        if data.len() as u64 > max_bytes {
            return Err(FetchError::TooLarge(max_bytes));
        }
        Ok(data)
    }
}

/// Turns an `img` source into displayable bytes.
pub struct ImageResolver {
    transport: Box<dyn Transport>,
    sleeper: Box<dyn Sleeper>,
    options: FetchOptions,
}

impl ImageResolver {
    /// Resolver backed by a real HTTP client.
    pub fn new(options: FetchOptions) -> Result<Self, Error> {
        let transport = HttpTransport::new(&options)?;
        Ok(Self::with_transport(transport, ThreadSleeper, options))
    }

    pub fn offline(options: FetchOptions) -> Self {
        Self::with_transport(OfflineTransport, ThreadSleeper, options)
    }

    pub fn with_transport(
        transport: impl Transport + 'static,
        sleeper: impl Sleeper + 'static,
        options: FetchOptions,
    ) -> Self {
        ImageResolver {
            transport: Box::new(transport),
            sleeper: Box::new(sleeper),
            options,
        }
    }

    /// Bytes of a decodable image for `src`, or the placeholder.
    pub fn load(&self, src: &str) -> Vec<u8> {
        let data = if src.starts_with("data:") {
            let data = load_inline_image(src);
            if data.is_none() {
                log::warn!("undecodable inline image payload, using placeholder");
            }
            data
        } else {
            self.load_external_image(src)
        };
        make_image(data)
    }

    fn load_external_image(&self, src: &str) -> Option<Vec<u8>> {
        let attempts = self.options.attempts.max(1);
        for attempt in 1..=attempts {
            match self.transport.get(src, self.options.max_image_size) {
                Ok(data) => return Some(data),
                Err(FetchError::Transient(msg)) if attempt < attempts => {
                    log::warn!("fetching {src} failed (attempt {attempt}/{attempts}): {msg}");
                    self.sleeper.sleep(self.options.backoff);
                }
                Err(FetchError::Transient(msg)) => {
                    log::warn!("giving up on {src} after {attempts} attempts: {msg}");
                    return None;
                }
                Err(err) => {
                    log::warn!("fetching {src} failed: {err}");
                    return None;
                }
            }
        }
        None
    }
}

/// Decode the payload of a `data:` locator. Only the base64 form is
/// understood; anything malformed yields `None`.
pub fn load_inline_image(src: &str) -> Option<Vec<u8>> {
    let (_, payload) = src.split_once(";base64,")?;
    STANDARD.decode(payload).ok()
}

fn make_image(data: Option<Vec<u8>>) -> Vec<u8> {
    match data {
        Some(data) if !data.is_empty() && ImageInfo::from_bytes(&data).is_some() => data,
        Some(_) => {
            log::warn!("image data is not a recognized raster format, using placeholder");
            PLACEHOLDER.to_vec()
        }
        None => PLACEHOLDER.to_vec(),
    }
}
