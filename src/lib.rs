//! Asynchronous moderation and enrichment pipeline for a travel-journal
//! platform: newly created or edited posts and comments are screened for
//! toxic content on a bounded background pool, posts optionally get
//! their country resolved from free text, and only accepted drafts reach
//! persistence. The submitting request never waits for the verdict.
pub mod config;
pub mod coordinator;
pub mod model;
pub mod moderate;
pub mod notify;
pub mod pool;
pub mod predict;
pub mod sink;
