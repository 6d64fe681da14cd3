//! # contract: seams to the external engines
//!
//! The rendering engine and the storage provider are black boxes. This module
//! defines the traits the pipelines talk to, so that real adapters
//! ([`crate::chromium`], [`crate::storage`]) and test doubles are interchangeable.
//!
//! ## Mocking & Testing
//! - [`BucketApi`] is annotated for `mockall`; `MockBucketApi` is exported under the
//!   `test-export-mocks` feature so integration tests can script provider responses.
//! - The browser traits consume the session on `close`, which `automock` does not
//!   model well; tests use small hand-written fakes instead.

use async_trait::async_trait;
#[allow(unused_imports)]
use mockall::{automock, predicate::*};

use crate::document::PdfOptions;
use crate::error::{BucketError, RenderError};

/// A live browser process. One session serves one document job.
#[async_trait]
pub trait BrowserSession: Send {
    /// Opens a fresh tab, loads `markup` and prints it to a PDF buffer.
    async fn render_pdf(
        &mut self,
        markup: &str,
        options: &PdfOptions,
    ) -> Result<Vec<u8>, RenderError>;

    /// Shuts the browser process down. Called exactly once per session.
    async fn close(self: Box<Self>) -> Result<(), RenderError>;
}

/// Starts browser processes.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, RenderError>;
}

/// One entry of a list-buckets response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketSummary {
    pub name: Option<String>,
    pub creation_date: Option<String>,
}

impl BucketSummary {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            creation_date: None,
        }
    }
}

/// A single list-buckets call against the provider.
///
/// `Ok(None)` means the response carried no buckets collection at all.
/// Implementations must not retry; retries belong to [`crate::storage::BucketLister`].
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait BucketApi: Send + Sync {
    async fn list_buckets(&self) -> Result<Option<Vec<BucketSummary>>, BucketError>;
}
