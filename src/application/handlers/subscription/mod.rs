//! Subscription flow handlers - webhook intake and propagation.

mod handle_payment_webhook;

pub use handle_payment_webhook::{
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler, SubscriptionDispatcher,
    SubscriptionEventHandler,
};
