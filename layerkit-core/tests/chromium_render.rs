//! Requires a local Chrome/Chromium; run with `cargo test -- --ignored`.

use layerkit_core::chromium::{ChromiumLauncher, ChromiumSettings};
use layerkit_core::document::{DocumentJob, DocumentSource};
use layerkit_core::render::generate_pdf;
use std::fs;
use tempfile::tempdir;

#[tokio::test]
#[ignore = "needs a Chrome/Chromium binary"]
async fn renders_two_sources_into_one_pdf() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first.html");
    let second = dir.path().join("second.html");
    fs::write(&first, "<html><body><h1>One</h1>{{ changeme }}</body></html>").unwrap();
    fs::write(&second, "<html><body><h1>Two</h1></body></html>").unwrap();
    let output = dir.path().join("output.pdf");

    let launcher = ChromiumLauncher::new(ChromiumSettings {
        executable: std::env::var_os("CHROME").map(Into::into),
        no_sandbox: true,
    });
    let job = DocumentJob::new(vec![DocumentSource::new(&first), DocumentSource::new(&second)])
        .with_output(&output);

    generate_pdf(&launcher, &job).await.expect("render should succeed");

    let bytes = fs::read(&output).unwrap();
    assert_eq!(&bytes[0..4], b"%PDF", "PDF file missing magic header");
    let pages = lopdf::Document::load_mem(&bytes).unwrap().get_pages().len();
    assert!(pages >= 2, "expected at least one page per source, got {pages}");
}
