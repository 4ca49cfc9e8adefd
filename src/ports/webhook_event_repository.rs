//! WebhookEventRepository port - tracking processed payment webhooks.
//!
//! The payment provider delivers events at-least-once and unordered, so
//! every event must be applied idempotently. This port tracks which provider
//! event ids have been handled, storing the full payload and outcome for
//! auditing.
//!
//! Implementations rely on a uniqueness constraint on the event id so that
//! two concurrent deliveries of the same event race safely: first insert
//! wins, the loser sees `AlreadyExists`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::foundation::DomainError;

/// Record of a processed payment webhook event.
#[derive(Debug, Clone)]
pub struct WebhookEventRecord {
    /// Provider event id (e.g. `evt_...`).
    pub event_id: String,

    /// Provider event type (e.g. `customer.subscription.updated`).
    pub event_type: String,

    /// When the event was processed.
    pub processed_at: DateTime<Utc>,

    /// Outcome of processing: "success" or "ignored".
    pub result: String,

    /// Reason, for ignored events.
    pub detail: Option<String>,

    /// Original event payload for auditing.
    pub payload: serde_json::Value,
}

impl WebhookEventRecord {
    /// Creates a success record.
    pub fn success(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Utc::now(),
            result: "success".to_string(),
            detail: None,
            payload,
        }
    }

    /// Creates an ignored record (event acknowledged but not acted on).
    pub fn ignored(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        reason: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Utc::now(),
            result: "ignored".to_string(),
            detail: Some(reason.into()),
            payload,
        }
    }
}

/// Result of attempting to save a webhook event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// First time seeing this event.
    Inserted,
    /// Another delivery already recorded it.
    AlreadyExists,
}

/// Result of webhook processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookResult {
    /// Event was processed by this delivery.
    Processed,
    /// Event was already processed (idempotent skip).
    AlreadyProcessed,
}

/// Port for storing and retrieving processed webhook events.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Finds a previously processed event by its provider event id.
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError>;

    /// Attempts to save a webhook event record.
    ///
    /// Returns `SaveResult::Inserted` for the first writer and
    /// `SaveResult::AlreadyExists` for everyone who lost the race.
    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError>;

    /// Deletes records processed before `timestamp` (retention policy).
    ///
    /// Returns the number of records deleted.
    async fn delete_before(&self, timestamp: DateTime<Utc>) -> Result<u64, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_record_has_correct_fields() {
        let record = WebhookEventRecord::success(
            "evt_123",
            "customer.subscription.updated",
            serde_json::json!({"id": "evt_123"}),
        );

        assert_eq!(record.event_id, "evt_123");
        assert_eq!(record.result, "success");
        assert!(record.detail.is_none());
    }

    #[test]
    fn ignored_record_includes_reason() {
        let record = WebhookEventRecord::ignored(
            "evt_456",
            "customer.created",
            "no handler for event type",
            serde_json::json!({}),
        );

        assert_eq!(record.result, "ignored");
        assert_eq!(record.detail, Some("no handler for event type".to_string()));
    }
}
