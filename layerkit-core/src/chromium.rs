//! Headless Chromium adapter for the rendering engine seam.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::contract::{BrowserLauncher, BrowserSession};
use crate::document::PdfOptions;
use crate::error::RenderError;

/// How to start Chromium.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChromiumSettings {
    /// Explicit browser binary; auto-detected when `None`.
    pub executable: Option<PathBuf>,
    /// Required when running as root inside containers.
    pub no_sandbox: bool,
}

/// Launches headless Chromium processes.
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher {
    settings: ChromiumSettings,
}

impl ChromiumLauncher {
    pub fn new(settings: ChromiumSettings) -> Self {
        Self { settings }
    }

    fn browser_config(&self) -> Result<BrowserConfig, RenderError> {
        let mut builder = BrowserConfig::builder();
        if let Some(executable) = &self.settings.executable {
            builder = builder.chrome_executable(executable);
        }
        if self.settings.no_sandbox {
            builder = builder.no_sandbox();
        }
        builder.build().map_err(RenderError::Launch)
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, RenderError> {
        Ok(Box::new(self.start().await?))
    }
}

impl ChromiumLauncher {
    async fn start(&self) -> Result<ChromiumSession, RenderError> {
        let config = self.browser_config()?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        // The CDP connection only makes progress while its handler is polled.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "Browser handler stopped");
                    break;
                }
            }
        });

        info!(
            executable = ?self.settings.executable,
            no_sandbox = self.settings.no_sandbox,
            "Launched headless browser"
        );
        Ok(ChromiumSession { browser, handler })
    }
}

/// A running Chromium process. Dropping it without `close` kills the child.
pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

pub(crate) fn print_params(options: &PdfOptions) -> PrintToPdfParams {
    let (width, height) = options.format.dimensions_in();
    PrintToPdfParams {
        paper_width: Some(width),
        paper_height: Some(height),
        print_background: Some(options.print_background),
        display_header_footer: Some(options.display_header_footer),
        ..Default::default()
    }
}

impl ChromiumSession {
    /// Prints `markup` in a fresh tab. The tab is closed whether or not printing succeeds.
    async fn print(&self, markup: &str, params: PrintToPdfParams) -> Result<Vec<u8>, RenderError> {
        let page = self.browser.new_page("about:blank").await?;
        let printed = print_page(&page, markup, params).await;
        if let Err(e) = page.close().await {
            warn!(error = %e, "Failed to close tab after rendering");
        }
        printed
    }
}

async fn print_page(
    page: &Page,
    markup: &str,
    params: PrintToPdfParams,
) -> Result<Vec<u8>, RenderError> {
    page.set_content(markup).await?;
    Ok(page.pdf(params).await?)
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn render_pdf(
        &mut self,
        markup: &str,
        options: &PdfOptions,
    ) -> Result<Vec<u8>, RenderError> {
        self.print(markup, print_params(options)).await
    }

    async fn close(self: Box<Self>) -> Result<(), RenderError> {
        let ChromiumSession {
            mut browser,
            handler,
        } = *self;
        browser
            .close()
            .await
            .map_err(|e| RenderError::Close(e.to_string()))?;
        if let Err(e) = browser.wait().await {
            warn!(error = %e, "Failed waiting for browser process to exit");
        }
        if let Err(e) = handler.await {
            warn!(error = %e, "Browser handler task ended abnormally");
        }
        info!("Closed headless browser");
        Ok(())
    }
}
