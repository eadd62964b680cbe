//! The per-job moderation algorithm: screen every text field of a draft,
//! reject on toxicity, enrich a post's sentinel country, accept the rest.
use anyhow::{anyhow, Result};
use futures::future::try_join;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::model::{CommentDraft, Entity, PostDraft};
use crate::predict::model::ToxicityScores;
use crate::predict::{CountryService, ToxicityService};

pub const REJECTED_TOXIC: &str = "contains toxic content";

#[derive(Debug, Error)]
pub enum ModerationError {
    /// Content decision: the draft must not publish. Resolved into a
    /// user notification downstream, never logged as an error.
    #[error("{0}")]
    Rejected(String),
    /// Operational failure talking to a prediction service. Logged and
    /// also surfaced to the user as a generic rejection.
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

/// True if any category score in any of the screened fields is strictly
/// above the threshold.
fn any_score_above(score_sets: &[ToxicityScores], threshold: f64) -> bool {
    score_sets
        .iter()
        .flat_map(|scores| scores.values())
        .any(|score| *score > threshold)
}

/// Screen and enrich one post draft. Title and content are scored
/// concurrently; the country field is resolved only when the draft
/// carries the auto-infer sentinel and only after screening passes.
#[instrument(skip_all, fields(user_id = post.user_id))]
pub async fn moderate_post(
    toxicity: &dyn ToxicityService,
    country: &dyn CountryService,
    credential: &str,
    threshold: f64,
    mut post: PostDraft,
) -> Result<Entity, ModerationError> {
    let (title_scores, content_scores) = try_join(
        toxicity.score(credential, &post.title),
        toxicity.score(credential, &post.content),
    )
    .await?;

    if any_score_above(&[title_scores, content_scores], threshold) {
        return Err(ModerationError::Rejected(REJECTED_TOXIC.to_string()));
    }

    if post.wants_country_inference() {
        let text = format!("{}. {}", post.title, post.content);
        let ranking = country.infer(credential, &text).await?;
        let top = ranking
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("country inference returned an empty ranking"))?;
        debug!(country = %top.country, confidence = top.confidence, "country resolved");
        post.country = top.country;
    }

    Ok(Entity::Post(post))
}

/// Screen one comment draft. Comments have a single text field and no
/// enrichment step.
#[instrument(skip_all, fields(user_id = comment.user_id))]
pub async fn moderate_comment(
    toxicity: &dyn ToxicityService,
    credential: &str,
    threshold: f64,
    comment: CommentDraft,
) -> Result<Entity, ModerationError> {
    let scores = toxicity.score(credential, &comment.content).await?;
    if any_score_above(&[scores], threshold) {
        return Err(ModerationError::Rejected(REJECTED_TOXIC.to_string()));
    }
    Ok(Entity::Comment(comment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn scores(pairs: &[(&str, f64)]) -> ToxicityScores {
        pairs
            .iter()
            .map(|(label, score)| (label.to_string(), *score))
            .collect()
    }

    #[test]
    fn scores_at_threshold_pass() {
        let set = scores(&[("toxicity", 0.6), ("insult", 0.59)]);
        assert!(!any_score_above(&[set], 0.6));
    }

    #[test]
    fn any_single_score_above_rejects() {
        let clean = scores(&[("toxicity", 0.01)]);
        let toxic = scores(&[("insult", 0.80), ("toxicity", 0.96)]);
        assert!(any_score_above(&[clean, toxic], 0.6));
    }

    #[test]
    fn empty_score_sets_pass() {
        assert!(!any_score_above(&[], 0.6));
        assert!(!any_score_above(&[BTreeMap::new()], 0.6));
    }
}
