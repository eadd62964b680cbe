use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use crate::predict::model::{
    CountryGuess, PredictResponse, PredictionStatus, ResultResponse, ToxicityScores,
};

pub mod model;

/// Poll attempts after which a single slow-job warning is emitted. A
/// diagnostic only; the loop never gives up (see DESIGN.md).
const SLOW_POLL_WARN_ATTEMPTS: u32 = 60;

/// Client for one prediction service speaking the predict/poll contract.
/// Both the toxicity and country-inference services expose this shape.
#[derive(Clone)]
pub struct PredictionClient {
    http: Client,
    base_url: Url,
    poll_interval: Duration,
}

impl fmt::Debug for PredictionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredictionClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Handle for a queued prediction job, scoped to the service that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionJob {
    pub job_id: String,
}

/// Toxicity screening: score one text across all categories.
#[async_trait]
pub trait ToxicityService: Send + Sync {
    async fn score(&self, credential: &str, text: &str) -> Result<ToxicityScores>;
}

/// Country inference: rank candidate countries for one text.
#[async_trait]
pub trait CountryService: Send + Sync {
    async fn infer(&self, credential: &str, text: &str) -> Result<Vec<CountryGuess>>;
}

impl PredictionClient {
    pub fn new(base_url: &str, poll_interval: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).context("invalid prediction service URL")?;
        Ok(Self::with_base_url(base_url, poll_interval))
    }

    pub fn with_base_url(mut base_url: Url, poll_interval: Duration) -> Self {
        // `Url::join` replaces the last path segment unless the base
        // ends with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder()
            .user_agent("tj-modbot/0.1")
            .no_proxy()
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url,
            poll_interval,
        }
    }

    /// Submit a text for prediction and return the job handle.
    pub async fn predict(&self, credential: &str, text: &str) -> Result<PredictionJob> {
        let endpoint = self
            .base_url
            .join("predict")
            .context("invalid prediction base URL")?;
        let res = self
            .http
            .post(endpoint)
            .header("Authorization", format!("Bearer {}", credential))
            .json(&json!({ "description": text }))
            .send()
            .await
            .context("failed to reach prediction service")?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("prediction error {}: {}", status, body));
        }

        let payload: PredictResponse = res
            .json()
            .await
            .context("invalid prediction response JSON")?;
        debug!(job_id = %payload.job_id, "prediction job queued");
        Ok(PredictionJob {
            job_id: payload.job_id,
        })
    }

    /// Fetch the current state of a prediction job. `T` is the shape of
    /// the `result` field once the job is done.
    async fn fetch_result<T: DeserializeOwned>(
        &self,
        credential: &str,
        job_id: &str,
    ) -> Result<ResultResponse<T>> {
        let endpoint = self
            .base_url
            .join(&format!("result/{}", job_id))
            .context("invalid prediction base URL")?;
        let res = self
            .http
            .get(endpoint)
            .header("Authorization", format!("Bearer {}", credential))
            .send()
            .await
            .context("failed to reach prediction service")?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("prediction result error {}: {}", status, body));
        }

        res.json().await.context("invalid prediction result JSON")
    }

    /// Poll `GET /result/{job_id}` at a fixed interval until the job is
    /// done. Suspends the calling task; no deadline is enforced.
    pub async fn poll_until_done<T: DeserializeOwned>(
        &self,
        credential: &str,
        job: &PredictionJob,
    ) -> Result<T> {
        let mut attempt = 0u32;
        loop {
            let res: ResultResponse<T> = self.fetch_result(credential, &job.job_id).await?;
            if res.status == PredictionStatus::Done {
                return res
                    .result
                    .ok_or_else(|| anyhow!("prediction job {} done without result", res.job_id));
            }
            attempt += 1;
            if attempt == SLOW_POLL_WARN_ATTEMPTS {
                warn!(job_id = %job.job_id, attempt, "prediction job still pending; worker slot held");
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl ToxicityService for PredictionClient {
    async fn score(&self, credential: &str, text: &str) -> Result<ToxicityScores> {
        let job = self.predict(credential, text).await?;
        self.poll_until_done(credential, &job).await
    }
}

#[async_trait]
impl CountryService for PredictionClient {
    async fn infer(&self, credential: &str, text: &str) -> Result<Vec<CountryGuess>> {
        let job = self.predict(credential, text).await?;
        self.poll_until_done(credential, &job).await
    }
}
