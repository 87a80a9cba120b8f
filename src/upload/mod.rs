pub mod browser;
pub mod cointracking;

pub use browser::{Browser, BrowserError, FirefoxSession};
pub use cointracking::{CoinTrackingUpload, Jitter, UploadError, UploadOptions, UploadState};
