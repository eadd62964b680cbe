use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PredictionStatus {
    Waiting,
    Predicting,
    Done,
}

/// Response to `POST /predict`: the handle for a queued prediction job.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictResponse {
    pub job_id: String,
    pub status: PredictionStatus,
}

/// Response to `GET /result/{job_id}`. `result` is only meaningful once
/// `status == done`.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultResponse<T> {
    pub job_id: String,
    pub status: PredictionStatus,
    pub result: Option<T>,
}

/// Per-category toxicity scores, label -> [0, 1].
pub type ToxicityScores = BTreeMap<String, f64>;

/// One entry of the country-inference ranking, highest confidence first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountryGuess {
    pub country: String,
    pub confidence: f64,
}
