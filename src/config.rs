// Runtime settings. The binary fills these from command-line flags and
// environment variables; library users and tests start from `Default`.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://www.googleapis.com/drive/v3";
pub const READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

/// Enough for a name lookup; a handful of same-named folders still shows up.
pub const DEFAULT_SEARCH_PAGE_SIZE: u32 = 10;
/// One page is treated as the whole folder; larger folders are truncated.
pub const DEFAULT_LISTING_PAGE_SIZE: u32 = 100;
pub const DEFAULT_CHUNK_SIZE: u64 = 100 * 1024 * 1024;

const CREDENTIALS_FILE_NAME: &str = "gcloud-key.json";

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base_url: String,
    pub search_page_size: u32,
    pub listing_page_size: u32,
    pub chunk_size: u64,
    /// Per-request limit. `None` waits as long as the transfer takes.
    pub request_timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_base_url: DEFAULT_API_URL.to_string(),
            search_page_size: DEFAULT_SEARCH_PAGE_SIZE,
            listing_page_size: DEFAULT_LISTING_PAGE_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            request_timeout: None,
        }
    }
}

/// Key file location used when neither `--credentials` nor
/// `DRIVE_CREDENTIALS` is given: `gcloud-key.json` in the home directory.
pub fn default_credentials_path() -> PathBuf {
    let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.join(CREDENTIALS_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_bounds() {
        let s = Settings::default();
        assert_eq!(s.search_page_size, 10);
        assert_eq!(s.listing_page_size, 100);
        assert_eq!(s.chunk_size, 104_857_600);
        assert!(s.api_base_url.ends_with("/drive/v3"));
        assert!(s.request_timeout.is_none());
    }

    #[test]
    fn default_key_file_name() {
        assert!(default_credentials_path().ends_with("gcloud-key.json"));
    }
}
