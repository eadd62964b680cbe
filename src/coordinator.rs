//! Bridges pool completions to the rest of the system: accepted drafts
//! go to persistence, rejections and failures become user notifications.
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

use crate::model::{JobKind, Notification};
use crate::notify::NotificationService;
use crate::pool::{Completion, CompletionError};
use crate::sink::{EntitySink, ErrorSink};

/// Rejection reason shown to the user when the pipeline itself failed,
/// so a submission is never silently stuck in "pending".
pub const GENERIC_FAILURE: &str = "could not be processed, please try again later";

/// Single consumer of the completion stream. Workers emit concurrently;
/// this loop applies their side effects sequentially.
pub struct Coordinator {
    sink: Arc<dyn EntitySink>,
    notifier: Arc<dyn NotificationService>,
    errors: Arc<dyn ErrorSink>,
}

impl Coordinator {
    pub fn new(
        sink: Arc<dyn EntitySink>,
        notifier: Arc<dyn NotificationService>,
        errors: Arc<dyn ErrorSink>,
    ) -> Self {
        Self {
            sink,
            notifier,
            errors,
        }
    }

    /// Drain the completion stream until the pool shuts down.
    pub async fn run(self, mut completions: mpsc::UnboundedReceiver<Completion>) {
        while let Some(completion) = completions.recv().await {
            self.handle(completion).await;
        }
        info!("completion stream closed; coordinator exiting");
    }

    #[instrument(skip_all, fields(job_id = %completion.job_id, kind = completion.entity_kind))]
    async fn handle(&self, completion: Completion) {
        match &completion.outcome {
            Ok(entity) => {
                let committed = match completion.job_kind {
                    JobKind::Create => self.sink.create(entity).await.map(|_| ()),
                    JobKind::Update => self.sink.update(entity).await,
                };
                match committed {
                    Ok(()) => info!(op = completion.job_kind.as_str(), "entity committed"),
                    Err(error) => {
                        self.errors.record("entity commit failed", &error).await;
                    }
                }
            }
            Err(CompletionError::Rejected { reason }) => {
                info!(reason = %reason, "draft rejected by moderation");
                self.notify_rejection(&completion, reason).await;
            }
            Err(CompletionError::Failed { error }) => {
                self.errors.record("moderation job failed", error).await;
                self.notify_rejection(&completion, GENERIC_FAILURE).await;
            }
        }
    }

    /// Best-effort, at-most-once. A failed send is logged and dropped;
    /// the original caller already got its "pending" response.
    async fn notify_rejection(&self, completion: &Completion, reason: &str) {
        let notification = Notification {
            title: format!(
                "Your {} cannot publish - {}",
                completion.entity_kind, completion.summary
            ),
            content: reason.to_string(),
            info: completion.entity_kind.to_string(),
            user_id: Some(completion.user_id),
        };
        if let Err(error) = self
            .notifier
            .send(&completion.credential, &notification)
            .await
        {
            warn!(?error, user_id = completion.user_id, "rejection notification failed");
        }
    }
}
