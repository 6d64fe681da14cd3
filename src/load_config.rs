/// `load_config` module: loads a static YAML config and injects session credentials from the environment.
///
/// This module is the only place where user-supplied YAML is parsed and mapped to the
/// strongly-typed models of `layerkit-core` (`DocumentJob`, `ClientConfig`, `StackDescriptor`).
///
/// # Responsibilities
/// - Parse the YAML file into intermediate, serde-friendly section structs
/// - Validate pairings the YAML schema cannot express (placeholder with content, full credential triple)
/// - Read secrets from the environment only, never from the file
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::{bail, Result};
use layerkit_core::chromium::ChromiumSettings;
use layerkit_core::config::StackDescriptor;
use layerkit_core::document::{
    DocumentJob, DocumentSource, PaperFormat, PdfOptions, Substitution, DEFAULT_OUTPUT,
};
use layerkit_core::retry::RetryPolicy;
use layerkit_core::storage::{ClientConfig, SessionCredentials};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

pub const ACCESS_KEY_ID_VAR: &str = "LAYERKIT_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY_VAR: &str = "LAYERKIT_SECRET_ACCESS_KEY";
pub const SESSION_TOKEN_VAR: &str = "LAYERKIT_SESSION_TOKEN";

/// Fully resolved configuration for the CLI.
#[derive(Debug)]
pub struct CliConfig {
    pub stack: StackDescriptor,
    /// `None` when the file has no `render` section.
    pub render: Option<DocumentJob>,
    pub browser: ChromiumSettings,
    pub storage: ClientConfig,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    stack: StackDescriptor,
    #[serde(default)]
    render: Option<RenderSection>,
    #[serde(default)]
    browser: BrowserSection,
    #[serde(default)]
    storage: StorageSection,
}

#[derive(Debug, Deserialize)]
struct RenderSection {
    #[serde(default = "default_output")]
    output: PathBuf,
    #[serde(default)]
    paper: PaperFormat,
    #[serde(default = "default_true")]
    print_background: bool,
    #[serde(default)]
    display_header_footer: bool,
    #[serde(default)]
    sources: Vec<SourceYaml>,
}

#[derive(Debug, Deserialize)]
struct SourceYaml {
    path: PathBuf,
    #[serde(default)]
    placeholder: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BrowserSection {
    #[serde(default)]
    executable: Option<PathBuf>,
    #[serde(default)]
    no_sandbox: bool,
}

#[derive(Debug, Default, Deserialize)]
struct StorageSection {
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    max_attempts: Option<u32>,
    #[serde(default)]
    delay_base_ms: Option<u64>,
    #[serde(default)]
    throttling_delay_base_ms: Option<u64>,
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT)
}

fn default_true() -> bool {
    true
}

/// Loads a static YAML config file (no secrets) and injects the session credentials from env.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let raw: RawConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    raw.stack.trace_loaded();

    let render = raw.render.map(document_job).transpose()?;
    let storage = client_config(raw.storage, &raw.stack, credentials_from_env()?)?;

    info!(
        render_sources = render.as_ref().map_or(0, |job| job.sources.len()),
        region = %storage.region,
        "Config loaded and merged successfully"
    );

    Ok(CliConfig {
        stack: raw.stack,
        render,
        browser: ChromiumSettings {
            executable: raw.browser.executable,
            no_sandbox: raw.browser.no_sandbox,
        },
        storage,
    })
}

fn document_job(section: RenderSection) -> Result<DocumentJob> {
    let mut sources = Vec::with_capacity(section.sources.len());
    for source in section.sources {
        let mut doc = DocumentSource::new(source.path);
        match (source.placeholder, source.content) {
            (Some(placeholder), Some(content)) => {
                doc = doc.with_substitution(Substitution::new(placeholder, content));
            }
            (None, None) => {}
            _ => {
                error!(path = %doc.path.display(), "Placeholder and content must be set together");
                bail!(
                    "Source {} must set both `placeholder` and `content`, or neither",
                    doc.path.display()
                );
            }
        }
        sources.push(doc);
    }

    Ok(DocumentJob::new(sources)
        .with_output(section.output)
        .with_options(PdfOptions {
            format: section.paper,
            print_background: section.print_background,
            display_header_footer: section.display_header_footer,
        }))
}

fn client_config(
    section: StorageSection,
    stack: &StackDescriptor,
    credentials: Option<SessionCredentials>,
) -> Result<ClientConfig> {
    let mut retry = RetryPolicy::default();
    if let Some(max_attempts) = section.max_attempts {
        if max_attempts == 0 {
            error!("storage.max_attempts must be at least 1");
            bail!("storage.max_attempts must be at least 1");
        }
        retry = retry.with_max_attempts(max_attempts);
    }
    if let Some(base) = section.delay_base_ms {
        retry = retry.with_delay_base(Duration::from_millis(base));
    }
    if let Some(base) = section.throttling_delay_base_ms {
        retry = retry.with_throttling_delay_base(Duration::from_millis(base));
    }

    let region = section.region.unwrap_or_else(|| stack.region.clone());
    let mut config = ClientConfig::new(region).with_retry(retry);
    if let Some(credentials) = credentials {
        config = config.with_credentials(credentials);
    }
    Ok(config)
}

/// Reads the session credential triple. All three variables or none.
pub fn credentials_from_env() -> Result<Option<SessionCredentials>> {
    let read = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
    let access_key_id = read(ACCESS_KEY_ID_VAR);
    let secret_access_key = read(SECRET_ACCESS_KEY_VAR);
    let session_token = read(SESSION_TOKEN_VAR);

    match (access_key_id, secret_access_key, session_token) {
        (Some(access_key_id), Some(secret_access_key), Some(session_token)) => {
            info!("Session credentials found in env");
            Ok(Some(SessionCredentials {
                access_key_id,
                secret_access_key,
                session_token,
            }))
        }
        (None, None, None) => {
            info!("No session credentials in env, using the default credential chain");
            Ok(None)
        }
        (a, s, t) => {
            let missing: Vec<&str> = [
                (a.is_none(), ACCESS_KEY_ID_VAR),
                (s.is_none(), SECRET_ACCESS_KEY_VAR),
                (t.is_none(), SESSION_TOKEN_VAR),
            ]
            .into_iter()
            .filter_map(|(absent, name)| absent.then_some(name))
            .collect();
            error!(?missing, "Incomplete session credentials in env");
            bail!(
                "Incomplete session credentials: missing {}",
                missing.join(", ")
            );
        }
    }
}
