use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{error, info, warn};
use rand::Rng;
use thiserror::Error;

use super::browser::{Browser, BrowserError};
use crate::models::UploadCredentials;

pub const LOGIN_URL: &str = "https://cointracking.info/index.php";
pub const IMPORT_URL: &str = "https://cointracking.info/import/kraken/";
pub const DIAGNOSTIC_FILE: &str = "error.html";

const USERNAME_INPUT: &str = "input#log_us";
const PASSWORD_INPUT: &str = "input#log_pw";
const LOGIN_BUTTON: &str = "input[name=\"login\"]";
const FILE_INPUT: &str = "input[type=\"file\"]";
const IMPORT_LINK: &str = "a[href=\"import.php\"]";
const IMPORT_START_BUTTON: &str = "input[name=\"import_start\"]";

/// Steps of the CoinTracking import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Start,
    NavigateLogin,
    Authenticate,
    NavigateImport,
    UploadFile,
    ConfirmImport,
    Done,
    Failed,
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UploadState::Start => "start",
            UploadState::NavigateLogin => "navigate-login",
            UploadState::Authenticate => "authenticate",
            UploadState::NavigateImport => "navigate-import",
            UploadState::UploadFile => "upload-file",
            UploadState::ConfirmImport => "confirm-import",
            UploadState::Done => "done",
            UploadState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("CoinTracking upload failed during {step}: {source}")]
    StepFailed {
        step: UploadState,
        #[source]
        source: BrowserError,
        /// Page markup saved for diagnosis, if it could be captured
        diagnostic: Option<PathBuf>,
    },
}

/// Random pause between page interactions
#[derive(Debug, Clone, Copy)]
pub struct Jitter {
    pub min: Duration,
    pub max: Duration,
}

impl Jitter {
    pub const NONE: Jitter = Jitter {
        min: Duration::ZERO,
        max: Duration::ZERO,
    };

    pub fn between_millis(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_millis(min),
            max: Duration::from_millis(max.max(min)),
        }
    }

    fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let millis = rand::thread_rng().gen_range(self.min.as_millis() as u64..=self.max.as_millis() as u64);
        Duration::from_millis(millis)
    }

    async fn pause(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub login_url: String,
    pub import_url: String,
    /// How long each element may take to become visible
    pub wait_timeout: Duration,
    /// Pause between typing and clicking
    pub short_pause: Jitter,
    /// Pause after handing over the file
    pub long_pause: Jitter,
    pub diagnostic_path: PathBuf,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            login_url: LOGIN_URL.to_string(),
            import_url: IMPORT_URL.to_string(),
            wait_timeout: Duration::from_secs(10),
            short_pause: Jitter::between_millis(1_000, 3_000),
            long_pause: Jitter::between_millis(3_000, 5_000),
            diagnostic_path: PathBuf::from(DIAGNOSTIC_FILE),
        }
    }
}

/// Logs into CoinTracking and submits a Kraken ledger CSV to its importer.
///
/// Every step has one way forward and one way to `Failed`; a failure saves the
/// page markup and stops without retrying. The browser is quit on every path.
pub struct CoinTrackingUpload<'a> {
    credentials: &'a UploadCredentials,
    options: UploadOptions,
}

impl<'a> CoinTrackingUpload<'a> {
    pub fn new(credentials: &'a UploadCredentials, options: UploadOptions) -> Self {
        Self {
            credentials,
            options,
        }
    }

    pub async fn run<B: Browser + ?Sized>(&self, browser: &mut B, csv_path: &Path) -> Result<(), UploadError> {
        let mut state = UploadState::Start;

        let outcome = loop {
            match self.advance(browser, state, csv_path).await {
                Ok(UploadState::Done) => {
                    info!("Successfully uploaded kraken CSV to cointracking.info!");
                    break Ok(());
                }
                Ok(next) => state = next,
                Err(source) => {
                    error!("CoinTracking upload: {} -> {}: {}", state, UploadState::Failed, source);
                    let diagnostic = self.capture_page(browser).await;
                    break Err(UploadError::StepFailed {
                        step: state,
                        source,
                        diagnostic,
                    });
                }
            }
        };

        if let Err(e) = browser.quit().await {
            warn!("Failed to close browser session: {}", e);
        }

        outcome
    }

    async fn advance<B: Browser + ?Sized>(
        &self,
        browser: &mut B,
        state: UploadState,
        csv_path: &Path,
    ) -> Result<UploadState, BrowserError> {
        let next = match state {
            UploadState::Start => UploadState::NavigateLogin,
            UploadState::NavigateLogin => {
                browser.goto(&self.options.login_url).await?;
                UploadState::Authenticate
            }
            UploadState::Authenticate => {
                self.visible(browser, USERNAME_INPUT).await?;
                self.visible(browser, PASSWORD_INPUT).await?;
                self.options.short_pause.pause().await;
                browser.click(USERNAME_INPUT).await?;
                browser.send_keys(USERNAME_INPUT, &self.credentials.username).await?;
                self.options.short_pause.pause().await;
                browser.send_keys(PASSWORD_INPUT, &self.credentials.password).await?;
                self.options.short_pause.pause().await;
                self.visible(browser, LOGIN_BUTTON).await?;
                browser.click(LOGIN_BUTTON).await?;
                UploadState::NavigateImport
            }
            UploadState::NavigateImport => {
                browser.goto(&self.options.import_url).await?;
                UploadState::UploadFile
            }
            UploadState::UploadFile => {
                self.visible(browser, FILE_INPUT).await?;
                browser
                    .send_keys(FILE_INPUT, &csv_path.to_string_lossy())
                    .await?;
                self.options.short_pause.pause().await;
                UploadState::ConfirmImport
            }
            UploadState::ConfirmImport => {
                self.visible(browser, IMPORT_LINK).await?;
                browser.click(IMPORT_LINK).await?;
                self.options.long_pause.pause().await;
                self.visible(browser, IMPORT_START_BUTTON).await?;
                browser.click(IMPORT_START_BUTTON).await?;
                UploadState::Done
            }
            UploadState::Done | UploadState::Failed => state,
        };

        info!("CoinTracking upload: {} -> {}", state, next);
        Ok(next)
    }

    async fn visible<B: Browser + ?Sized>(&self, browser: &mut B, selector: &str) -> Result<(), BrowserError> {
        browser.wait_visible(selector, self.options.wait_timeout).await
    }

    /// Save the current page for diagnosis
    async fn capture_page<B: Browser + ?Sized>(&self, browser: &mut B) -> Option<PathBuf> {
        let markup = match browser.page_source().await {
            Ok(markup) => markup,
            Err(e) => {
                warn!("Could not capture page source: {}", e);
                return None;
            }
        };

        let path = &self.options.diagnostic_path;
        match tokio::fs::write(path, markup).await {
            Ok(()) => {
                error!("Saved failing page to {}", path.display());
                Some(path.clone())
            }
            Err(e) => {
                warn!("Could not write {}: {}", path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;

    /// Records interactions; selectors in `missing` never become visible
    #[derive(Default)]
    struct FakeBrowser {
        missing: HashSet<&'static str>,
        actions: Vec<String>,
        quit_calls: usize,
    }

    impl FakeBrowser {
        fn without(selector: &'static str) -> Self {
            Self {
                missing: HashSet::from([selector]),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl Browser for FakeBrowser {
        async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
            self.actions.push(format!("goto {}", url));
            Ok(())
        }

        async fn wait_visible(&mut self, selector: &str, _timeout: Duration) -> Result<(), BrowserError> {
            if self.missing.contains(selector) {
                return Err(BrowserError::ElementNotFound {
                    selector: selector.to_string(),
                });
            }
            Ok(())
        }

        async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
            self.actions.push(format!("click {}", selector));
            Ok(())
        }

        async fn send_keys(&mut self, selector: &str, text: &str) -> Result<(), BrowserError> {
            self.actions.push(format!("type {} {}", selector, text));
            Ok(())
        }

        async fn page_source(&mut self) -> Result<String, BrowserError> {
            Ok("<html><body>captcha</body></html>".to_string())
        }

        async fn quit(&mut self) -> Result<(), BrowserError> {
            self.quit_calls += 1;
            Ok(())
        }
    }

    fn credentials() -> UploadCredentials {
        UploadCredentials {
            username: "alice".to_string(),
            password: "hunter2".to_string(),
        }
    }

    fn options(dir: &Path) -> UploadOptions {
        UploadOptions {
            login_url: "https://tracker.test/index.php".to_string(),
            import_url: "https://tracker.test/import/kraken/".to_string(),
            wait_timeout: Duration::from_millis(10),
            short_pause: Jitter::NONE,
            long_pause: Jitter::NONE,
            diagnostic_path: dir.join("error.html"),
        }
    }

    #[tokio::test]
    async fn test_successful_upload_follows_every_step() {
        let dir = tempfile::tempdir().unwrap();
        let creds = credentials();
        let mut browser = FakeBrowser::default();

        CoinTrackingUpload::new(&creds, options(dir.path()))
            .run(&mut browser, Path::new("/data/exports/latest-kraken-export.csv"))
            .await
            .unwrap();

        assert_eq!(
            browser.actions,
            vec![
                "goto https://tracker.test/index.php".to_string(),
                "click input#log_us".to_string(),
                "type input#log_us alice".to_string(),
                "type input#log_pw hunter2".to_string(),
                "click input[name=\"login\"]".to_string(),
                "goto https://tracker.test/import/kraken/".to_string(),
                "type input[type=\"file\"] /data/exports/latest-kraken-export.csv".to_string(),
                "click a[href=\"import.php\"]".to_string(),
                "click input[name=\"import_start\"]".to_string(),
            ]
        );
        assert_eq!(browser.quit_calls, 1);
        assert!(!dir.path().join("error.html").exists());
    }

    #[tokio::test]
    async fn test_missing_element_captures_page_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        let creds = credentials();
        let mut browser = FakeBrowser::without(FILE_INPUT);

        let err = CoinTrackingUpload::new(&creds, options(dir.path()))
            .run(&mut browser, Path::new("/tmp/out.csv"))
            .await
            .unwrap_err();

        let UploadError::StepFailed { step, source, diagnostic } = err;
        assert_eq!(step, UploadState::UploadFile);
        assert!(matches!(source, BrowserError::ElementNotFound { .. }));

        let saved = diagnostic.unwrap();
        assert_eq!(
            std::fs::read_to_string(saved).unwrap(),
            "<html><body>captcha</body></html>"
        );

        // Nothing after the failing step ran, and the session was still released
        assert!(!browser.actions.iter().any(|a| a.contains("import_start")));
        assert_eq!(browser.quit_calls, 1);
    }

    #[tokio::test]
    async fn test_login_failure_does_not_type_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let creds = credentials();
        let mut browser = FakeBrowser::without(PASSWORD_INPUT);

        let err = CoinTrackingUpload::new(&creds, options(dir.path()))
            .run(&mut browser, Path::new("/tmp/out.csv"))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::StepFailed { step: UploadState::Authenticate, .. }));
        assert!(!browser.actions.iter().any(|a| a.contains("hunter2")));
        assert_eq!(browser.quit_calls, 1);
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let jitter = Jitter::between_millis(100, 200);
        for _ in 0..100 {
            let d = jitter.sample();
            assert!(d >= Duration::from_millis(100) && d <= Duration::from_millis(200));
        }
        assert_eq!(Jitter::NONE.sample(), Duration::ZERO);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(UploadState::NavigateLogin.to_string(), "navigate-login");
        assert_eq!(UploadState::Failed.to_string(), "failed");
    }
}
