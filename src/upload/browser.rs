use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use log::{debug, info, warn};
use serde_json::json;
use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::time::{sleep, Instant};

use crate::models::Settings;

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const DRIVER_STARTUP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Element not visible: {selector}")]
    ElementNotFound { selector: String },

    #[error("Failed to start WebDriver '{path}': {reason}")]
    Driver { path: String, reason: String },

    #[error("WebDriver session error: {0}")]
    Session(String),

    #[error("WebDriver command failed: {0}")]
    Command(String),
}

impl From<CmdError> for BrowserError {
    fn from(err: CmdError) -> Self {
        BrowserError::Command(err.to_string())
    }
}

/// Page interactions the upload flow needs, addressed by CSS selector
#[async_trait]
pub trait Browser: Send {
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Wait until an element matching `selector` is displayed
    async fn wait_visible(&mut self, selector: &str, timeout: Duration) -> Result<(), BrowserError>;

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError>;

    async fn send_keys(&mut self, selector: &str, text: &str) -> Result<(), BrowserError>;

    /// Full rendered markup of the current page
    async fn page_source(&mut self) -> Result<String, BrowserError>;

    /// End the session and release every process behind it
    async fn quit(&mut self) -> Result<(), BrowserError>;
}

/// Headless Firefox driven through a geckodriver child process
pub struct FirefoxSession {
    client: Option<Client>,
    driver: Child,
}

impl FirefoxSession {
    /// Spawn geckodriver and open a headless session on it
    pub async fn launch(settings: &Settings) -> Result<Self, BrowserError> {
        info!("Webdriver path: {}", settings.webdriver_path);

        let mut driver = Command::new(&settings.webdriver_path)
            .arg("--port")
            .arg(settings.webdriver_port.to_string())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BrowserError::Driver {
                path: settings.webdriver_path.clone(),
                reason: e.to_string(),
            })?;

        let url = format!("http://127.0.0.1:{}", settings.webdriver_port);
        let mut capabilities = serde_json::Map::new();
        capabilities.insert(
            "moz:firefoxOptions".to_string(),
            json!({ "args": ["-headless"] }),
        );

        let deadline = Instant::now() + DRIVER_STARTUP_TIMEOUT;
        let client = loop {
            match ClientBuilder::native()
                .capabilities(capabilities.clone())
                .connect(&url)
                .await
            {
                Ok(client) => break client,
                Err(e) if Instant::now() < deadline => {
                    debug!("WebDriver not ready yet: {}", e);
                    sleep(POLL_INTERVAL).await;
                }
                Err(e) => {
                    let _ = driver.kill().await;
                    return Err(BrowserError::Session(e.to_string()));
                }
            }
        };

        Ok(Self {
            client: Some(client),
            driver,
        })
    }

    fn client(&self) -> Result<&Client, BrowserError> {
        self.client
            .as_ref()
            .ok_or_else(|| BrowserError::Session("session already closed".to_string()))
    }

    async fn find(&self, selector: &str) -> Result<fantoccini::elements::Element, BrowserError> {
        self.client()?
            .find(Locator::Css(selector))
            .await
            .map_err(|e| lookup_error(selector, e))
    }
}

/// Only a missing element is worth waiting for; anything else means the session is gone
fn lookup_error(selector: &str, err: CmdError) -> BrowserError {
    match err {
        ref e if e.is_no_such_element() => BrowserError::ElementNotFound {
            selector: selector.to_string(),
        },
        other => BrowserError::from(other),
    }
}

#[async_trait]
impl Browser for FirefoxSession {
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        debug!("Navigating to {}", url);
        self.client()?.goto(url).await?;
        Ok(())
    }

    async fn wait_visible(&mut self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.find(selector).await {
                Ok(element) => {
                    if element.is_displayed().await? {
                        return Ok(());
                    }
                }
                Err(BrowserError::ElementNotFound { .. }) => {}
                Err(e) => return Err(e),
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::ElementNotFound {
                    selector: selector.to_string(),
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
        self.find(selector).await?.click().await?;
        Ok(())
    }

    async fn send_keys(&mut self, selector: &str, text: &str) -> Result<(), BrowserError> {
        self.find(selector).await?.send_keys(text).await?;
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String, BrowserError> {
        Ok(self.client()?.source().await?)
    }

    async fn quit(&mut self) -> Result<(), BrowserError> {
        let closed = match self.client.take() {
            Some(client) => client.close().await.map_err(BrowserError::from),
            None => Ok(()),
        };

        if let Err(e) = self.driver.kill().await {
            warn!("Failed to stop WebDriver: {}", e);
        }

        closed
    }
}
