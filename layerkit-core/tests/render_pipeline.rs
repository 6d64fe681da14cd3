mod common;

use async_trait::async_trait;
use common::{page_count, page_texts, text_pdf};
use layerkit_core::contract::{BrowserLauncher, BrowserSession};
use layerkit_core::document::{
    DocumentJob, DocumentSource, PdfOptions, Substitution, CHANGEME_CONTENT, CHANGEME_TOKEN,
};
use layerkit_core::error::RenderError;
use layerkit_core::render::generate_pdf;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

/// Stand-in engine: prints the markup verbatim onto a single page.
#[derive(Default, Clone)]
struct FakeLauncher {
    launches: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    rendered: Arc<Mutex<Vec<String>>>,
    fail_on: Option<&'static str>,
    fail_close: bool,
}

struct FakeSession {
    closes: Arc<AtomicUsize>,
    rendered: Arc<Mutex<Vec<String>>>,
    fail_on: Option<&'static str>,
    fail_close: bool,
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, RenderError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            closes: self.closes.clone(),
            rendered: self.rendered.clone(),
            fail_on: self.fail_on,
            fail_close: self.fail_close,
        }))
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn render_pdf(
        &mut self,
        markup: &str,
        options: &PdfOptions,
    ) -> Result<Vec<u8>, RenderError> {
        assert_eq!(*options, PdfOptions::default());
        if let Some(marker) = self.fail_on {
            if markup.contains(marker) {
                return Err(RenderError::Engine("page crashed".into()));
            }
        }
        self.rendered.lock().unwrap().push(markup.to_string());
        Ok(text_pdf(&[markup]))
    }

    async fn close(self: Box<Self>) -> Result<(), RenderError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(RenderError::Close("browser did not exit".into()));
        }
        Ok(())
    }
}

fn write_source(dir: &Path, name: &str, body: &str) -> DocumentSource {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    DocumentSource::new(path)
}

#[tokio::test]
async fn changeme_token_is_replaced_in_rendered_output() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), "a.html", "<body>{{ changeme }}</body>");
    let output = dir.path().join("out.pdf");
    let launcher = FakeLauncher::default();

    let job = DocumentJob::new(vec![source]).with_output(&output);
    let report = generate_pdf(&launcher, &job).await.expect("job should succeed");

    assert_eq!(report.output, output);
    assert_eq!(report.sources, 1);
    let merged = std::fs::read(&output).unwrap();
    assert_eq!(report.bytes, merged.len());
    let texts = page_texts(&merged);
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains(CHANGEME_CONTENT));
    assert!(!texts[0].contains(CHANGEME_TOKEN));
}

#[tokio::test]
async fn only_first_changeme_occurrence_is_replaced() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), "twice.html", "{{ changeme }} and {{ changeme }}");
    let launcher = FakeLauncher::default();

    let job = DocumentJob::new(vec![source]).with_output(dir.path().join("out.pdf"));
    generate_pdf(&launcher, &job).await.unwrap();

    let rendered = launcher.rendered.lock().unwrap();
    assert_eq!(
        rendered[0],
        format!("{CHANGEME_CONTENT} and {CHANGEME_TOKEN}")
    );
}

#[tokio::test]
async fn sources_render_in_order_with_their_own_substitutions() {
    let dir = tempdir().unwrap();
    let first = write_source(dir.path(), "1.html", "first {{ name }}")
        .with_substitution(Substitution::new("{{ name }}", "alpha"));
    let second = write_source(dir.path(), "2.html", "second {{ name }}")
        .with_substitution(Substitution::new("{{ name }}", "beta"));
    let third = write_source(dir.path(), "3.html", "third {{ name }}");
    let output = dir.path().join("out.pdf");
    let launcher = FakeLauncher::default();

    let job = DocumentJob::new(vec![first, second, third]).with_output(&output);
    generate_pdf(&launcher, &job).await.unwrap();

    let merged = std::fs::read(&output).unwrap();
    assert_eq!(page_count(&merged), 3);
    let texts = page_texts(&merged);
    assert!(texts[0].contains("first alpha"));
    assert!(texts[1].contains("second beta"));
    assert!(texts[2].contains("third {{ name }}"));
    assert_eq!(launcher.launches.load(Ordering::SeqCst), 1);
    assert_eq!(launcher.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_source_aborts_job_and_still_closes_browser() {
    let dir = tempdir().unwrap();
    let present = write_source(dir.path(), "a.html", "fine");
    let missing = DocumentSource::new(dir.path().join("missing.html"));
    let output = dir.path().join("out.pdf");
    let launcher = FakeLauncher::default();

    let job = DocumentJob::new(vec![present, missing]).with_output(&output);
    let err = generate_pdf(&launcher, &job).await.unwrap_err();

    assert!(matches!(err, RenderError::Read { .. }), "got {err:?}");
    assert_eq!(launcher.closes.load(Ordering::SeqCst), 1);
    assert!(!output.exists(), "no output may be written on failure");
}

#[tokio::test]
async fn engine_failure_aborts_job_and_still_closes_browser() {
    let dir = tempdir().unwrap();
    let ok = write_source(dir.path(), "ok.html", "fine");
    let bad = write_source(dir.path(), "bad.html", "CRASH here");
    let never = write_source(dir.path(), "never.html", "not reached");
    let output = dir.path().join("out.pdf");
    let launcher = FakeLauncher {
        fail_on: Some("CRASH"),
        ..FakeLauncher::default()
    };

    let job = DocumentJob::new(vec![ok, bad, never]).with_output(&output);
    let err = generate_pdf(&launcher, &job).await.unwrap_err();

    assert!(matches!(err, RenderError::Engine(_)), "got {err:?}");
    assert_eq!(launcher.closes.load(Ordering::SeqCst), 1);
    assert_eq!(launcher.rendered.lock().unwrap().len(), 1);
    assert!(!output.exists());
}

#[tokio::test]
async fn render_error_wins_over_close_error() {
    let dir = tempdir().unwrap();
    let bad = write_source(dir.path(), "bad.html", "CRASH");
    let output = dir.path().join("out.pdf");
    let launcher = FakeLauncher {
        fail_on: Some("CRASH"),
        fail_close: true,
        ..FakeLauncher::default()
    };

    let job = DocumentJob::new(vec![bad]).with_output(&output);
    let err = generate_pdf(&launcher, &job).await.unwrap_err();

    assert!(matches!(err, RenderError::Engine(_)), "got {err:?}");
    assert_eq!(launcher.closes.load(Ordering::SeqCst), 1);
    assert!(!output.exists());
}

#[tokio::test]
async fn close_failure_after_clean_render_fails_job_without_output() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), "a.html", "fine");
    let output = dir.path().join("out.pdf");
    let launcher = FakeLauncher {
        fail_close: true,
        ..FakeLauncher::default()
    };

    let job = DocumentJob::new(vec![source]).with_output(&output);
    let err = generate_pdf(&launcher, &job).await.unwrap_err();

    assert!(matches!(err, RenderError::Close(_)), "got {err:?}");
    assert_eq!(launcher.rendered.lock().unwrap().len(), 1);
    assert_eq!(launcher.closes.load(Ordering::SeqCst), 1);
    assert!(!output.exists(), "no output may be written when close fails");
}

#[tokio::test]
async fn existing_output_is_overwritten() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), "a.html", "fresh");
    let output = dir.path().join("out.pdf");
    std::fs::write(&output, b"stale bytes").unwrap();
    let launcher = FakeLauncher::default();

    let job = DocumentJob::new(vec![source]).with_output(&output);
    generate_pdf(&launcher, &job).await.unwrap();

    let merged = std::fs::read(&output).unwrap();
    assert_eq!(&merged[0..4], b"%PDF");
    assert!(page_texts(&merged)[0].contains("fresh"));
}

#[tokio::test]
async fn empty_job_writes_zero_page_document() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("out.pdf");
    let launcher = FakeLauncher::default();

    let job = DocumentJob::new(Vec::new()).with_output(&output);
    generate_pdf(&launcher, &job).await.unwrap();

    assert_eq!(page_count(&std::fs::read(&output).unwrap()), 0);
    assert_eq!(launcher.closes.load(Ordering::SeqCst), 1);
}
