//! Subscription domain - payment webhook consumption and access propagation.

mod payment_event;
mod processor;
mod propagator;
mod webhook_errors;
mod webhook_verifier;

pub use payment_event::{
    InvoiceObject, PaymentEvent, PaymentEventData, PaymentEventType, SubscriptionObject,
};
pub use processor::{IdempotentWebhookProcessor, WebhookDispatcher, WebhookEventHandler};
pub use propagator::{PropagationOutcome, SubscriptionPropagator};
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{SignatureHeader, WebhookVerifier};

#[cfg(test)]
pub use payment_event::PaymentEventBuilder;
#[cfg(test)]
pub use webhook_verifier::sign_test_payload;
