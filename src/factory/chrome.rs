//! Chrome/Chromium session factory.
//!
//! [`ChromeBrowserFactory`] launches headless Chrome through the
//! `headless_chrome` crate and wraps each process in a [`ChromeSession`].
//!
//! # Example
//!
//! ```rust,ignore
//! use html2pdf_gateway::ChromeBrowserFactory;
//!
//! // Auto-detect Chrome installation
//! let factory = ChromeBrowserFactory::with_defaults();
//!
//! // Or specify custom path
//! let factory = ChromeBrowserFactory::with_path("/usr/bin/google-chrome".to_string());
//! ```

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};

use super::BrowserFactory;
use crate::error::{BrowserError, Result};
use crate::service::PdfOptions;
use crate::traits::{BrowserSession, Healthcheck};

/// Factory for Chrome/Chromium sessions.
///
/// # Thread Safety
///
/// This factory is `Send + Sync` and can be safely shared across threads.
pub struct ChromeBrowserFactory {
    /// Produces launch options for each new browser.
    launch_options_fn: Box<dyn Fn() -> Result<LaunchOptions<'static>> + Send + Sync>,
}

impl ChromeBrowserFactory {
    /// Create factory with a custom launch options function.
    ///
    /// ```rust,ignore
    /// use html2pdf_gateway::{ChromeBrowserFactory, create_chrome_options, BrowserError};
    ///
    /// let factory = ChromeBrowserFactory::new(|| {
    ///     create_chrome_options(Some("/custom/path"))
    ///         .map_err(|e| BrowserError::Configuration(e.to_string()))
    /// });
    /// ```
    pub fn new<F>(launch_options_fn: F) -> Self
    where
        F: Fn() -> Result<LaunchOptions<'static>> + Send + Sync + 'static,
    {
        Self {
            launch_options_fn: Box::new(launch_options_fn),
        }
    }

    /// Create factory with auto-detected Chrome path.
    ///
    /// # Platform Detection
    ///
    /// | Platform | Paths Searched |
    /// |----------|----------------|
    /// | Linux | `/usr/bin/google-chrome`, `/usr/bin/chromium`, etc. |
    /// | macOS | `/Applications/Google Chrome.app/...` |
    /// | Windows | `C:\Program Files\Google\Chrome\...` |
    pub fn with_defaults() -> Self {
        log::debug!("🔧 Creating ChromeBrowserFactory with auto-detect");
        Self::new(|| {
            create_chrome_options(None).map_err(|e| BrowserError::Configuration(e.to_string()))
        })
    }

    /// Create factory with custom Chrome binary path.
    pub fn with_path(chrome_path: String) -> Self {
        log::debug!("🔧 Creating ChromeBrowserFactory with custom path: {}", chrome_path);
        Self::new(move || {
            create_chrome_options(Some(&chrome_path))
                .map_err(|e| BrowserError::Configuration(e.to_string()))
        })
    }

    /// Pick [`with_path`](Self::with_path) or [`with_defaults`](Self::with_defaults).
    pub fn from_optional_path(chrome_path: Option<String>) -> Self {
        match chrome_path {
            Some(path) => Self::with_path(path),
            None => Self::with_defaults(),
        }
    }
}

impl BrowserFactory for ChromeBrowserFactory {
    /// Launch a new Chrome process.
    ///
    /// # Errors
    ///
    /// * [`BrowserError::Configuration`] if launch options cannot be built.
    /// * [`BrowserError::BrowserCreation`] if Chrome fails to launch.
    fn create(&self) -> Result<Arc<dyn BrowserSession>> {
        log::trace!("🔧 ChromeBrowserFactory::create() called");

        let options = (self.launch_options_fn)()?;

        log::debug!("🚀 Launching Chrome browser...");
        let browser = Browser::new(options).map_err(|e| {
            log::error!("❌ Chrome launch failed: {}", e);
            BrowserError::BrowserCreation(e.to_string())
        })?;

        Ok(Arc::new(ChromeSession::new(browser)))
    }
}

/// A live headless Chrome process.
///
/// The process is terminated when the session is closed or dropped.
pub struct ChromeSession {
    browser: Mutex<Option<Browser>>,
}

impl ChromeSession {
    /// Wrap an already launched browser.
    pub fn new(browser: Browser) -> Self {
        Self {
            browser: Mutex::new(Some(browser)),
        }
    }

    fn with_browser<T>(
        &self,
        on_missing: impl FnOnce() -> BrowserError,
        f: impl FnOnce(&Browser) -> Result<T>,
    ) -> Result<T> {
        let guard = self.browser.lock().unwrap_or_else(|e| e.into_inner());
        match guard.as_ref() {
            Some(browser) => f(browser),
            None => Err(on_missing()),
        }
    }
}

impl Healthcheck for ChromeSession {
    /// Open and close a blank tab.
    fn ping(&self) -> Result<()> {
        self.with_browser(
            || BrowserError::HealthCheckFailed("session closed".to_string()),
            |browser| {
                let tab = browser.new_tab().map_err(|e| {
                    log::warn!("⚠️ Browser ping failed (new_tab): {}", e);
                    BrowserError::HealthCheckFailed(e.to_string())
                })?;
                let _ = tab.close(true);
                Ok(())
            },
        )
    }
}

impl BrowserSession for ChromeSession {
    fn render(&self, html: &str, options: &PdfOptions, timeout: Duration) -> Result<Vec<u8>> {
        let start_time = Instant::now();
        let data_url = format!("data:text/html;charset=utf-8,{}", urlencoding::encode(html));

        self.with_browser(
            || BrowserError::RenderFailed("session closed".to_string()),
            |browser| {
                let tab = browser.new_tab().map_err(|e| {
                    log::error!("❌ Failed to create tab: {}", e);
                    BrowserError::RenderFailed(format!("tab creation failed: {}", e))
                })?;
                tab.set_default_timeout(timeout);

                let result = tab
                    .navigate_to(&data_url)
                    .and_then(|t| t.wait_until_navigated())
                    .map_err(|e| {
                        log::error!("❌ Failed to load content: {}", e);
                        BrowserError::RenderFailed(format!("content load failed: {}", e))
                    })
                    .and_then(|page| {
                        page.print_to_pdf(build_print_options(options)).map_err(|e| {
                            log::error!("❌ Failed to print PDF: {}", e);
                            BrowserError::RenderFailed(format!("print failed: {}", e))
                        })
                    });

                close_tab_safely(&tab);

                if let Ok(pdf) = &result {
                    log::debug!(
                        "PDF rendered in {:?} ({} bytes)",
                        start_time.elapsed(),
                        pdf.len()
                    );
                }
                result
            },
        )
    }

    fn close(&self) {
        let browser = self
            .browser
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if browser.is_some() {
            log::debug!("🔒 Closing Chrome session");
        }
        drop(browser);
    }
}

/// Build `PrintToPdfOptions` for the requested paper.
///
/// Margins are zero and header/footer disabled.
fn build_print_options(options: &PdfOptions) -> Option<PrintToPdfOptions> {
    let (width, height) = options.format().dimensions_inches();
    Some(PrintToPdfOptions {
        display_header_footer: Some(false),
        print_background: Some(options.print_background()),
        paper_width: Some(width),
        paper_height: Some(height),
        margin_top: Some(0.0),
        margin_bottom: Some(0.0),
        margin_left: Some(0.0),
        margin_right: Some(0.0),
        ..Default::default()
    })
}

/// Close a tab, logging instead of failing.
fn close_tab_safely(tab: &headless_chrome::Tab) {
    if let Err(e) = tab.close(true) {
        log::warn!("Failed to close tab (continuing anyway): {}", e);
    }
}

/// Create Chrome launch options with optional custom path.
///
/// # Chrome Flags Applied
///
/// ## Memory and Performance
/// - `--disable-dev-shm-usage` - Use /tmp instead of /dev/shm (container-friendly)
/// - `--disable-crash-reporter`
/// - `--max_old_space_size=1024` - Limit V8 heap to 1GB
///
/// ## GPU and Rendering
/// - `--disable-gpu-compositing`
/// - `--disable-software-rasterizer`
/// - `--disable-webgl`
///
/// ## Disabled Features
/// - `--disable-extensions`
/// - `--disable-sync`
/// - `--disable-default-apps`
///
/// ## Stability
/// - `--disable-background-timer-throttling`
/// - `--disable-renderer-backgrounding`
/// - `--disable-ipc-flooding-protection`
///
/// Rendered documents come from request bodies, so web security stays on.
pub fn create_chrome_options(
    chrome_path: Option<&str>,
) -> std::result::Result<LaunchOptions<'static>, Box<dyn std::error::Error + Send + Sync>> {
    let mut builder = LaunchOptions::default_builder();

    if let Some(path) = chrome_path {
        builder.path(Some(path.to_string().into()));
        log::trace!("🔧 Chrome path set to: {}", path);
    } else {
        log::trace!("🔧 Chrome path: auto-detect");
    }

    builder
        .headless(true)
        .sandbox(false) // required in most containers
        .disable_default_args(true)
        .idle_browser_timeout(Duration::from_secs(300))
        .args(vec![
            "--disable-dev-shm-usage".as_ref(),
            "--disable-crash-reporter".as_ref(),
            "--max_old_space_size=1024".as_ref(),
            "--disable-gpu-compositing".as_ref(),
            "--disable-software-rasterizer".as_ref(),
            "--disable-webgl".as_ref(),
            "--disable-extensions".as_ref(),
            "--disable-sync".as_ref(),
            "--disable-default-apps".as_ref(),
            "--disable-background-timer-throttling".as_ref(),
            "--disable-renderer-backgrounding".as_ref(),
            "--disable-ipc-flooding-protection".as_ref(),
        ])
        .build()
        .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> {
            let path_msg = chrome_path.unwrap_or("auto-detect");
            log::error!(
                "❌ Failed to build Chrome launch options (path: {}): {}",
                path_msg,
                e
            );
            e.into()
        })
}

// ============================================================================
// Unit Tests
// ============================================================================
