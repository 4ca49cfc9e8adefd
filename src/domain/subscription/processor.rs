//! Idempotent webhook processing.
//!
//! The payment provider delivers events at-least-once and in no particular
//! order, so the processor makes every delivery safe to repeat:
//!
//! 1. Skip events whose id is already recorded.
//! 2. Dispatch to the handler for the event type.
//! 3. Record the outcome. Concurrent deliveries of the same event race on
//!    the event-id uniqueness constraint; the loser reports
//!    `AlreadyProcessed`.
//!
//! Retryable failures (store errors, subscription not yet linked) are NOT
//! recorded, so the provider's redelivery gets a full reprocessing pass
//! instead of an idempotent skip.

use async_trait::async_trait;

use super::payment_event::{PaymentEvent, PaymentEventType};
use super::webhook_errors::WebhookError;
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookResult};

/// Handler for one or more payment event types.
#[async_trait]
pub trait WebhookEventHandler: Send + Sync {
    /// The event types this handler processes.
    fn handles(&self) -> Vec<PaymentEventType>;

    /// Handles the event.
    ///
    /// Returns `Err(WebhookError::Ignored(_))` when the event should be
    /// acknowledged without action; other errors are real failures.
    async fn handle(&self, event: &PaymentEvent) -> Result<(), WebhookError>;
}

/// Routes events to their handlers.
#[async_trait]
pub trait WebhookDispatcher: Send + Sync {
    /// Finds the handler registered for an event type.
    fn get_handler(&self, event_type: &PaymentEventType) -> Option<&dyn WebhookEventHandler>;

    /// Dispatches an event, or reports it ignored when nothing handles it.
    async fn dispatch(&self, event: &PaymentEvent) -> Result<(), WebhookError> {
        let event_type = event.parsed_type();
        match self.get_handler(&event_type) {
            Some(handler) => handler.handle(event).await,
            None => Err(WebhookError::Ignored(format!(
                "no handler for event type {}",
                event.event_type
            ))),
        }
    }
}

/// Entry point for processing verified payment events exactly once.
pub struct IdempotentWebhookProcessor<R: WebhookEventRepository, D: WebhookDispatcher> {
    repository: R,
    dispatcher: D,
}

impl<R: WebhookEventRepository, D: WebhookDispatcher> IdempotentWebhookProcessor<R, D> {
    pub fn new(repository: R, dispatcher: D) -> Self {
        Self {
            repository,
            dispatcher,
        }
    }

    /// Processes an event, skipping it if a previous delivery already did.
    ///
    /// # Returns
    ///
    /// - `Ok(WebhookResult::Processed)` when this delivery did the work
    /// - `Ok(WebhookResult::AlreadyProcessed)` for a duplicate delivery
    /// - `Err(_)` when processing failed; retryable errors leave no record
    pub async fn process(&self, event: PaymentEvent) -> Result<WebhookResult, WebhookError> {
        if self.repository.find_by_event_id(&event.id).await?.is_some() {
            tracing::debug!(event_id = %event.id, "webhook event already processed, skipping");
            return Ok(WebhookResult::AlreadyProcessed);
        }

        let result = self.dispatcher.dispatch(&event).await;

        let record = match &result {
            Ok(()) => WebhookEventRecord::success(&event.id, &event.event_type, event.to_payload()),
            Err(WebhookError::Ignored(reason)) => {
                WebhookEventRecord::ignored(&event.id, &event.event_type, reason, event.to_payload())
            }
            // No record for failures: the redelivery must reprocess.
            Err(e) => {
                tracing::warn!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    error = %e,
                    retryable = e.is_retryable(),
                    "webhook event processing failed"
                );
                return Err(e.clone());
            }
        };

        match self.repository.save(record).await? {
            SaveResult::Inserted => Ok(WebhookResult::Processed),
            SaveResult::AlreadyExists => Ok(WebhookResult::AlreadyProcessed),
        }
    }
}
