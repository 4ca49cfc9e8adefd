//! HandlePaymentWebhookHandler - verified, idempotent webhook intake.
//!
//! The full pipeline for one delivery:
//!
//! 1. Verify the signature and parse the event.
//! 2. Run it through the idempotent processor (duplicate deliveries skip).
//! 3. The dispatched handler resolves the organization, assigns the new
//!    subscription status, and fans the access flag out to members.
//! 4. When the event flipped the organization from no-access to access,
//!    kick an enrollment provisioning pass for every active member.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::handlers::enrollment::{
    ProvisionCourseAccessCommand, ProvisionCourseAccessHandler,
};
use crate::domain::subscription::{
    IdempotentWebhookProcessor, InvoiceObject, PaymentEvent, PaymentEventType,
    SubscriptionObject, SubscriptionPropagator, WebhookDispatcher, WebhookError,
    WebhookEventHandler, WebhookVerifier,
};
use crate::ports::{MembershipStore, WebhookEventRepository, WebhookResult};

/// Command carrying one raw webhook delivery.
#[derive(Debug, Clone)]
pub struct HandlePaymentWebhookCommand {
    pub payload: Vec<u8>,
    pub signature_header: String,
}

/// Handles subscription lifecycle and invoice events.
pub struct SubscriptionEventHandler {
    propagator: SubscriptionPropagator,
    memberships: Arc<dyn MembershipStore>,
    provisioner: Arc<ProvisionCourseAccessHandler>,
}

impl SubscriptionEventHandler {
    pub fn new(
        propagator: SubscriptionPropagator,
        memberships: Arc<dyn MembershipStore>,
        provisioner: Arc<ProvisionCourseAccessHandler>,
    ) -> Self {
        Self {
            propagator,
            memberships,
            provisioner,
        }
    }

    async fn apply_subscription_event(
        &self,
        billing_subscription_id: &str,
        provider_status: &str,
        plan: Option<&str>,
    ) -> Result<(), WebhookError> {
        let outcome = self
            .propagator
            .apply(billing_subscription_id, provider_status, plan)
            .await?;

        if outcome.access_gained {
            self.provision_active_members(&outcome.organization_id).await;
        }

        Ok(())
    }

    /// Best-effort: a failed pass leaves gaps the idempotent provisioner
    /// fills on the next trigger.
    async fn provision_active_members(
        &self,
        organization_id: &crate::domain::foundation::OrganizationId,
    ) {
        let members = match self.memberships.list_active(organization_id).await {
            Ok(members) => members,
            Err(e) => {
                tracing::warn!(error = %e, "failed to list members for provisioning");
                return;
            }
        };

        for member in members {
            let Some(user_id) = member.user_id else {
                continue;
            };
            let command = ProvisionCourseAccessCommand {
                organization_id: *organization_id,
                user_id,
            };
            if let Err(e) = self.provisioner.handle(command).await {
                tracing::warn!(
                    membership_id = %member.id,
                    error = %e,
                    "enrollment provisioning after access grant failed"
                );
            }
        }
    }
}

#[async_trait]
impl WebhookEventHandler for SubscriptionEventHandler {
    fn handles(&self) -> Vec<PaymentEventType> {
        vec![
            PaymentEventType::SubscriptionCreated,
            PaymentEventType::SubscriptionUpdated,
            PaymentEventType::SubscriptionDeleted,
            PaymentEventType::InvoicePaymentSucceeded,
            PaymentEventType::InvoicePaymentFailed,
        ]
    }

    async fn handle(&self, event: &PaymentEvent) -> Result<(), WebhookError> {
        match event.parsed_type() {
            PaymentEventType::SubscriptionCreated | PaymentEventType::SubscriptionUpdated => {
                let subscription: SubscriptionObject = event
                    .deserialize_object()
                    .map_err(|e| WebhookError::ParseError(e.to_string()))?;
                let plan = subscription.plan.as_ref().map(|p| p.id.as_str());
                self.apply_subscription_event(&subscription.id, &subscription.status, plan)
                    .await
            }
            PaymentEventType::SubscriptionDeleted => {
                let subscription: SubscriptionObject = event
                    .deserialize_object()
                    .map_err(|e| WebhookError::ParseError(e.to_string()))?;
                // A deleted subscription always means no access, whatever
                // status string the final object carries.
                self.apply_subscription_event(&subscription.id, "canceled", None)
                    .await
            }
            PaymentEventType::InvoicePaymentSucceeded => {
                let invoice: InvoiceObject = event
                    .deserialize_object()
                    .map_err(|e| WebhookError::ParseError(e.to_string()))?;
                match invoice.subscription {
                    Some(id) => self.apply_subscription_event(&id, "active", None).await,
                    None => Err(WebhookError::Ignored(
                        "invoice not tied to a subscription".to_string(),
                    )),
                }
            }
            PaymentEventType::InvoicePaymentFailed => {
                let invoice: InvoiceObject = event
                    .deserialize_object()
                    .map_err(|e| WebhookError::ParseError(e.to_string()))?;
                match invoice.subscription {
                    Some(id) => self.apply_subscription_event(&id, "past_due", None).await,
                    None => Err(WebhookError::Ignored(
                        "invoice not tied to a subscription".to_string(),
                    )),
                }
            }
            PaymentEventType::Unknown => Err(WebhookError::Ignored(format!(
                "no handler for event type {}",
                event.event_type
            ))),
        }
    }
}

/// Routes every handled event type to the single subscription handler.
pub struct SubscriptionDispatcher {
    handler: SubscriptionEventHandler,
}

impl SubscriptionDispatcher {
    pub fn new(handler: SubscriptionEventHandler) -> Self {
        Self { handler }
    }
}

impl WebhookDispatcher for SubscriptionDispatcher {
    fn get_handler(&self, event_type: &PaymentEventType) -> Option<&dyn WebhookEventHandler> {
        if self.handler.handles().contains(event_type) {
            Some(&self.handler)
        } else {
            None
        }
    }
}

/// Entry point for raw webhook deliveries.
pub struct HandlePaymentWebhookHandler<R: WebhookEventRepository> {
    verifier: WebhookVerifier,
    processor: IdempotentWebhookProcessor<R, SubscriptionDispatcher>,
}

impl<R: WebhookEventRepository> HandlePaymentWebhookHandler<R> {
    pub fn new(
        verifier: WebhookVerifier,
        repository: R,
        dispatcher: SubscriptionDispatcher,
    ) -> Self {
        Self {
            verifier,
            processor: IdempotentWebhookProcessor::new(repository, dispatcher),
        }
    }

    pub async fn handle(
        &self,
        command: HandlePaymentWebhookCommand,
    ) -> Result<WebhookResult, WebhookError> {
        let event = self
            .verifier
            .verify_and_parse(&command.payload, &command.signature_header)?;

        tracing::debug!(
            event_id = %event.id,
            event_type = %event.event_type,
            "webhook delivery verified"
        );

        self.processor.process(event).await
    }
}
