//! Document job model and placeholder substitution.
//!
//! A [`DocumentJob`] is an ordered list of HTML sources. Each [`DocumentSource`]
//! owns its optional [`Substitution`], so a placeholder can never be applied to
//! the wrong file. Every source additionally gets the fixed [`CHANGEME_TOKEN`]
//! replaced with [`CHANGEME_CONTENT`] before rendering.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Token replaced in every source just before rendering.
pub const CHANGEME_TOKEN: &str = "{{ changeme }}";

/// Literal markup inserted in place of [`CHANGEME_TOKEN`].
pub const CHANGEME_CONTENT: &str = "<p>This is dynamically inserted content.</p>";

/// Default path of the merged document.
pub const DEFAULT_OUTPUT: &str = "output.pdf";

/// A placeholder token and the content that replaces its first occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub placeholder: String,
    pub content: String,
}

impl Substitution {
    pub fn new(placeholder: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            content: content.into(),
        }
    }

    /// Replaces the first occurrence only; later occurrences are left alone.
    pub fn apply(&self, text: &str) -> String {
        text.replacen(&self.placeholder, &self.content, 1)
    }
}

/// Applies each text's own substitution, preserving order.
pub fn substitute_all(entries: &[(String, Substitution)]) -> Vec<String> {
    entries
        .iter()
        .map(|(text, substitution)| substitution.apply(text))
        .collect()
}

/// One HTML source file of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSource {
    pub path: PathBuf,
    pub substitution: Option<Substitution>,
}

impl DocumentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            substitution: None,
        }
    }

    pub fn with_substitution(mut self, substitution: Substitution) -> Self {
        self.substitution = Some(substitution);
        self
    }

    /// Turns the raw file text into the markup handed to the engine:
    /// the source's own substitution first, then the fixed changeme token.
    pub fn prepare_markup(&self, raw: &str) -> String {
        let text = match &self.substitution {
            Some(substitution) => substitution.apply(raw),
            None => raw.to_owned(),
        };
        text.replacen(CHANGEME_TOKEN, CHANGEME_CONTENT, 1)
    }
}

/// Paper sizes understood by the engine adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaperFormat {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
    Tabloid,
}

impl PaperFormat {
    /// `(width, height)` in inches.
    pub fn dimensions_in(&self) -> (f64, f64) {
        match self {
            PaperFormat::A3 => (11.7, 16.54),
            PaperFormat::A4 => (8.27, 11.7),
            PaperFormat::A5 => (5.83, 8.27),
            PaperFormat::Letter => (8.5, 11.0),
            PaperFormat::Legal => (8.5, 14.0),
            PaperFormat::Tabloid => (11.0, 17.0),
        }
    }
}

/// Print settings applied to every page of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdfOptions {
    pub format: PaperFormat,
    pub print_background: bool,
    pub display_header_footer: bool,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            format: PaperFormat::A4,
            print_background: true,
            display_header_footer: false,
        }
    }
}

/// Ordered sources plus where the merged result goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentJob {
    pub sources: Vec<DocumentSource>,
    pub output: PathBuf,
    pub options: PdfOptions,
}

impl DocumentJob {
    pub fn new(sources: Vec<DocumentSource>) -> Self {
        Self {
            sources,
            output: PathBuf::from(DEFAULT_OUTPUT),
            options: PdfOptions::default(),
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_options(mut self, options: PdfOptions) -> Self {
        self.options = options;
        self
    }
}
