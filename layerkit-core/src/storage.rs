//! Storage client construction and bucket enumeration.
//!
//! [`S3BucketApi`] performs exactly one SDK call per invocation; the SDK's own
//! transport retries are switched off so that [`RetryPolicy`] alone decides
//! how often and how long to back off. [`BucketLister`] drives those retries.

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::list_buckets::ListBucketsError;
use backon::Retryable;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::contract::{BucketApi, BucketSummary};
use crate::error::BucketError;
use crate::retry::RetryPolicy;

/// Provider error codes that mean "slow down".
const THROTTLING_CODES: [&str; 8] = [
    "Throttling",
    "ThrottlingException",
    "ThrottledException",
    "RequestThrottledException",
    "TooManyRequestsException",
    "RequestLimitExceeded",
    "SlowDown",
    "BandwidthLimitExceeded",
];

/// Temporary session credentials. Always complete: all three parts or none.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
}

impl fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &"** redacted **")
            .finish()
    }
}

/// Everything needed to build a storage client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub region: String,
    pub credentials: Option<SessionCredentials>,
    pub retry: RetryPolicy,
}

impl ClientConfig {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            credentials: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_credentials(mut self, credentials: SessionCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// [`BucketApi`] backed by the AWS S3 SDK.
#[derive(Debug, Clone)]
pub struct S3BucketApi {
    client: aws_sdk_s3::Client,
}

impl S3BucketApi {
    /// Builds an S3 client bound to `config.region`, using the explicit session
    /// credentials when present and the SDK's default chain otherwise.
    pub async fn connect(config: &ClientConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .retry_config(RetryConfig::disabled());

        if let Some(creds) = &config.credentials {
            loader = loader.credentials_provider(Credentials::new(
                creds.access_key_id.clone(),
                creds.secret_access_key.clone(),
                Some(creds.session_token.clone()),
                None,
                "layerkit-session",
            ));
        }

        let sdk_config = loader.load().await;
        info!(
            region = %config.region,
            explicit_credentials = config.credentials.is_some(),
            max_attempts = config.retry.max_attempts,
            "Constructed S3 client"
        );
        Self {
            client: aws_sdk_s3::Client::new(&sdk_config),
        }
    }
}

#[async_trait]
impl BucketApi for S3BucketApi {
    async fn list_buckets(&self) -> Result<Option<Vec<BucketSummary>>, BucketError> {
        let output = self.client.list_buckets().send().await.map_err(classify)?;
        Ok(output.buckets.map(|buckets| {
            buckets
                .into_iter()
                .map(|bucket| BucketSummary {
                    name: bucket.name,
                    creation_date: bucket.creation_date.map(|d| d.to_string()),
                })
                .collect()
        }))
    }
}

/// Sorts an SDK failure into throttled, transient or fatal.
pub(crate) fn classify(err: SdkError<ListBucketsError, HttpResponse>) -> BucketError {
    let message = DisplayErrorContext(&err).to_string();
    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            BucketError::Transient(message)
        }
        SdkError::ServiceError(service) => {
            let status = service.raw().status().as_u16();
            classify_service(service.err().code(), status, message)
        }
        _ => BucketError::Service(message),
    }
}

fn classify_service(code: Option<&str>, status: u16, message: String) -> BucketError {
    match code {
        Some(code) if THROTTLING_CODES.contains(&code) => BucketError::Throttled(message),
        _ if status == 429 => BucketError::Throttled(message),
        _ if status >= 500 => BucketError::Transient(message),
        _ => BucketError::Service(message),
    }
}

/// Lists bucket names through any [`BucketApi`], retrying per [`RetryPolicy`].
pub struct BucketLister<A> {
    api: A,
    retry: RetryPolicy,
}

impl BucketLister<S3BucketApi> {
    /// Builds the S3-backed lister described by `config`.
    pub async fn connect(config: &ClientConfig) -> Self {
        Self::new(S3BucketApi::connect(config).await, config.retry)
    }
}

impl<A: BucketApi> BucketLister<A> {
    pub fn new(api: A, retry: RetryPolicy) -> Self {
        Self { api, retry }
    }

    /// Bucket names in provider order. No dedup, no sort, no pagination.
    /// A response without a buckets collection yields an empty list.
    /// Throttled attempts wait on the policy's throttling base.
    pub async fn get_all_bucket_names(&self) -> Result<Vec<String>, BucketError> {
        let mut retries = 0u32;
        let buckets = (|| self.api.list_buckets())
            .retry(self.retry.backoff())
            .when(BucketError::is_retryable)
            .adjust(|err: &BucketError, delay: Option<Duration>| {
                let delay = delay?;
                retries += 1;
                match err {
                    BucketError::Throttled(_) => Some(self.retry.throttled_delay_for(retries)),
                    _ => Some(delay),
                }
            })
            .notify(|err: &BucketError, delay: Duration| {
                warn!(error = %err, ?delay, "Retrying list-buckets");
            })
            .await?;

        let Some(buckets) = buckets else {
            debug!("Provider response carried no buckets collection");
            return Ok(Vec::new());
        };

        let names: Vec<String> = buckets
            .into_iter()
            .filter_map(|bucket| {
                if bucket.name.is_none() {
                    warn!(creation_date = ?bucket.creation_date, "Skipping bucket without a name");
                }
                bucket.name
            })
            .collect();
        info!(count = names.len(), "Listed buckets");
        Ok(names)
    }
}
