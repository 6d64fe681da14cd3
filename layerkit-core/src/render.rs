//! Document job pipeline: read → substitute → render → merge → write.
//!
//! Sources are rendered strictly one after another in a single browser
//! session. The session is closed on every exit path once it has been
//! launched; if rendering failed, that error wins over a close error.

use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::contract::{BrowserLauncher, BrowserSession};
use crate::document::{DocumentJob, DocumentSource, PdfOptions};
use crate::error::RenderError;
use crate::merge::merge_pdfs;

/// Summary of a finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderReport {
    pub output: PathBuf,
    pub sources: usize,
    pub bytes: usize,
}

/// Runs a whole document job and writes the merged PDF to `job.output`,
/// replacing any file already there.
pub async fn generate_pdf<L>(launcher: &L, job: &DocumentJob) -> Result<RenderReport, RenderError>
where
    L: BrowserLauncher + ?Sized,
{
    info!(
        sources = job.sources.len(),
        output = %job.output.display(),
        "Starting document job"
    );

    let merged = render_and_merge(launcher, &job.sources, &job.options).await?;

    tokio::fs::write(&job.output, &merged)
        .await
        .map_err(|source| {
            error!(path = %job.output.display(), error = ?source, "Failed to write merged PDF");
            RenderError::Write {
                path: job.output.clone(),
                source,
            }
        })?;

    info!(
        output = %job.output.display(),
        bytes = merged.len(),
        "Document job complete"
    );
    Ok(RenderReport {
        output: job.output.clone(),
        sources: job.sources.len(),
        bytes: merged.len(),
    })
}

/// Renders every source in a scoped browser session and merges the pages.
pub async fn render_and_merge<L>(
    launcher: &L,
    sources: &[DocumentSource],
    options: &PdfOptions,
) -> Result<Vec<u8>, RenderError>
where
    L: BrowserLauncher + ?Sized,
{
    let mut session = launcher.launch().await?;
    debug!("Browser session launched");

    let rendered = render_pages(session.as_mut(), sources, options).await;
    let closed = session.close().await;

    let pages = match (rendered, closed) {
        (Ok(pages), Ok(())) => pages,
        (Ok(_), Err(close_err)) => {
            error!(error = %close_err, "Failed to close browser session");
            return Err(close_err);
        }
        (Err(render_err), closed) => {
            if let Err(close_err) = closed {
                warn!(error = %close_err, "Browser close also failed after render error");
            }
            error!(error = %render_err, "Rendering failed");
            return Err(render_err);
        }
    };

    Ok(merge_pdfs(&pages)?)
}

/// One PDF buffer per source, in input order. Stops at the first failure.
pub async fn render_pages(
    session: &mut dyn BrowserSession,
    sources: &[DocumentSource],
    options: &PdfOptions,
) -> Result<Vec<Vec<u8>>, RenderError> {
    let mut pages = Vec::with_capacity(sources.len());
    for source in sources {
        let raw = tokio::fs::read_to_string(&source.path)
            .await
            .map_err(|e| {
                error!(path = %source.path.display(), error = ?e, "Failed to read source file");
                RenderError::Read {
                    path: source.path.clone(),
                    source: e,
                }
            })?;

        let markup = source.prepare_markup(&raw);
        let pdf = session.render_pdf(&markup, options).await?;
        debug!(path = %source.path.display(), bytes = pdf.len(), "Rendered source");
        pages.push(pdf);
    }
    Ok(pages)
}
