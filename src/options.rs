use std::time::Duration;

use crate::model::Emu;

/// 10 MiB.
pub const MAX_IMAGE_SIZE: u64 = 10 * 1024 * 1024;

/// Space inside the default template margins that auto-fit images must stay in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageArea {
    pub usable_width: Emu,
    /// LibreOffice caps image height to this value.
    pub usable_height: Emu,
}

impl Default for PageArea {
    fn default() -> Self {
        Self {
            usable_width: Emu::from_inches(5.8),
            usable_height: Emu::from_inches(8.1),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchOptions {
    pub max_image_size: u64,
    /// Total attempts for a remote image, first try included.
    pub attempts: u32,
    pub backoff: Duration,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_image_size: MAX_IMAGE_SIZE,
            attempts: 3,
            backoff: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(30),
            user_agent: concat!("html2docx/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    pub page: PageArea,
    pub fetch: FetchOptions,
}
