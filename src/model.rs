use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder country value on a post draft meaning "infer the country
/// from the text instead of trusting user input".
pub const AUTO_COUNTRY: &str = "FIND";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Create,
    Update,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Create => "create",
            JobKind::Update => "update",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostDraft {
    pub id: Option<i64>,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub country: String,
}

impl PostDraft {
    pub fn wants_country_inference(&self) -> bool {
        self.country == AUTO_COUNTRY
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentDraft {
    pub id: Option<i64>,
    pub user_id: i64,
    pub post_id: i64,
    pub content: String,
}

/// A post or comment draft awaiting moderation. Not visible to the rest
/// of the system until a worker accepts it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    Post(PostDraft),
    Comment(CommentDraft),
}

impl Entity {
    pub fn user_id(&self) -> i64 {
        match self {
            Entity::Post(p) => p.user_id,
            Entity::Comment(c) => c.user_id,
        }
    }

    /// Short text used when telling the owner their draft was rejected:
    /// the post title or the comment body.
    pub fn summary(&self) -> &str {
        match self {
            Entity::Post(p) => &p.title,
            Entity::Comment(c) => &c.content,
        }
    }

    pub fn kind_str(&self) -> &'static str {
        match self {
            Entity::Post(_) => "post",
            Entity::Comment(_) => "comment",
        }
    }
}

/// One unit of moderation work. Built by the request handler, consumed
/// exactly once by a pool worker; lives only in process memory.
#[derive(Debug, Clone)]
pub struct Job {
    pub job_id: Uuid,
    pub credential: String,
    pub job_kind: JobKind,
    pub entity: Entity,
    pub submitted_at: DateTime<Utc>,
}

impl Job {
    pub fn new(credential: impl Into<String>, job_kind: JobKind, entity: Entity) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            credential: credential.into(),
            job_kind,
            entity,
            submitted_at: Utc::now(),
        }
    }
}

/// Message pushed to the notification service. Constructed here, never
/// persisted by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub title: String,
    pub content: String,
    pub info: String,
    pub user_id: Option<i64>,
}
