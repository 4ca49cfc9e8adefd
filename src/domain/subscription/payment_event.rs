//! Payment provider webhook event types.
//!
//! Only the fields the engine acts on are captured; the rest of the
//! provider's event schema is ignored on deserialization and preserved in
//! the raw payload kept for auditing.

use serde::{Deserialize, Serialize};

/// A webhook event delivered by the payment provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentEvent {
    /// Provider event id (`evt_...`). Dedup key for idempotent processing.
    pub id: String,

    /// Event type string (e.g. "customer.subscription.updated").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Unix timestamp the provider created the event.
    pub created: i64,

    /// Event-specific data.
    pub data: PaymentEventData,

    /// Whether this event originated in live mode.
    pub livemode: bool,

    /// Provider API version the event was rendered with.
    pub api_version: String,
}

/// Container for the event's polymorphic data object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentEventData {
    /// The object that triggered the event; shape depends on event type.
    pub object: serde_json::Value,

    /// Previous values of changed attributes (update events only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_attributes: Option<serde_json::Value>,
}

impl PaymentEvent {
    /// Parses the event type into a known variant.
    pub fn parsed_type(&self) -> PaymentEventType {
        PaymentEventType::from_str(&self.event_type)
    }

    /// Deserializes the data object as a concrete type.
    pub fn deserialize_object<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.object.clone())
    }

    /// Serializes the whole event back to JSON for audit storage.
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Event types the engine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEventType {
    /// A subscription was created at the provider.
    SubscriptionCreated,
    /// A subscription's status or attributes changed.
    SubscriptionUpdated,
    /// A subscription ended.
    SubscriptionDeleted,
    /// A recurring invoice was paid.
    InvoicePaymentSucceeded,
    /// A recurring invoice payment failed.
    InvoicePaymentFailed,
    /// Anything else; acknowledged but not acted on.
    Unknown,
}

impl PaymentEventType {
    pub fn from_str(s: &str) -> Self {
        match s {
            "customer.subscription.created" => Self::SubscriptionCreated,
            "customer.subscription.updated" => Self::SubscriptionUpdated,
            "customer.subscription.deleted" => Self::SubscriptionDeleted,
            "invoice.payment_succeeded" => Self::InvoicePaymentSucceeded,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubscriptionCreated => "customer.subscription.created",
            Self::SubscriptionUpdated => "customer.subscription.updated",
            Self::SubscriptionDeleted => "customer.subscription.deleted",
            Self::InvoicePaymentSucceeded => "invoice.payment_succeeded",
            Self::InvoicePaymentFailed => "invoice.payment_failed",
            Self::Unknown => "unknown",
        }
    }
}

/// The subscription object carried by `customer.subscription.*` events.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    /// Billing subscription id (`sub_...`).
    pub id: String,

    /// Provider status string ("active", "trialing", "past_due", ...).
    pub status: String,

    /// End of the current billing period (Unix timestamp).
    pub current_period_end: Option<i64>,

    /// Plan identifier, when present.
    #[serde(default)]
    pub plan: Option<PlanObject>,
}

/// Plan fragment nested in the subscription object.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanObject {
    pub id: String,
}

/// The invoice object carried by `invoice.payment_*` events.
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceObject {
    /// The billing subscription this invoice belongs to, if any.
    pub subscription: Option<String>,
}

/// Builder for test events.
#[cfg(test)]
pub struct PaymentEventBuilder {
    id: String,
    event_type: String,
    created: i64,
    object: serde_json::Value,
    previous_attributes: Option<serde_json::Value>,
    livemode: bool,
}

#[cfg(test)]
impl Default for PaymentEventBuilder {
    fn default() -> Self {
        Self {
            id: "evt_test_001".to_string(),
            event_type: "customer.subscription.updated".to_string(),
            created: chrono::Utc::now().timestamp(),
            object: serde_json::json!({}),
            previous_attributes: None,
            livemode: false,
        }
    }
}

#[cfg(test)]
impl PaymentEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn created(mut self, created: i64) -> Self {
        self.created = created;
        self
    }

    pub fn object(mut self, object: serde_json::Value) -> Self {
        self.object = object;
        self
    }

    pub fn previous_attributes(mut self, attrs: serde_json::Value) -> Self {
        self.previous_attributes = Some(attrs);
        self
    }

    pub fn livemode(mut self, livemode: bool) -> Self {
        self.livemode = livemode;
        self
    }

    pub fn build(self) -> PaymentEvent {
        PaymentEvent {
            id: self.id,
            event_type: self.event_type,
            created: self.created,
            data: PaymentEventData {
                object: self.object,
                previous_attributes: self.previous_attributes,
            },
            livemode: self.livemode,
            api_version: "2024-06-20".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialize_subscription_updated_event() {
        let json = r#"{
            "id": "evt_abc",
            "type": "customer.subscription.updated",
            "created": 1704067200,
            "data": {
                "object": {"id": "sub_1", "status": "active"},
                "previous_attributes": {"status": "trialing"}
            },
            "livemode": true,
            "api_version": "2024-06-20"
        }"#;

        let event: PaymentEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.id, "evt_abc");
        assert_eq!(event.parsed_type(), PaymentEventType::SubscriptionUpdated);
        assert!(event.livemode);
        let prev = event.data.previous_attributes.unwrap();
        assert_eq!(prev["status"], "trialing");
    }

    #[test]
    fn deserialize_subscription_object() {
        let event = PaymentEventBuilder::new()
            .object(json!({
                "id": "sub_42",
                "status": "past_due",
                "current_period_end": 1706745600,
                "plan": {"id": "plan_team_monthly"}
            }))
            .build();

        let sub: SubscriptionObject = event.deserialize_object().unwrap();
        assert_eq!(sub.id, "sub_42");
        assert_eq!(sub.status, "past_due");
        assert_eq!(sub.current_period_end, Some(1706745600));
        assert_eq!(sub.plan.unwrap().id, "plan_team_monthly");
    }

    #[test]
    fn deserialize_subscription_object_without_plan() {
        let event = PaymentEventBuilder::new()
            .object(json!({"id": "sub_7", "status": "canceled", "current_period_end": null}))
            .build();

        let sub: SubscriptionObject = event.deserialize_object().unwrap();
        assert_eq!(sub.status, "canceled");
        assert!(sub.plan.is_none());
    }

    #[test]
    fn deserialize_invoice_object() {
        let event = PaymentEventBuilder::new()
            .event_type("invoice.payment_succeeded")
            .object(json!({"subscription": "sub_9", "amount_paid": 4900}))
            .build();

        let invoice: InvoiceObject = event.deserialize_object().unwrap();
        assert_eq!(invoice.subscription.as_deref(), Some("sub_9"));
    }

    #[test]
    fn invoice_without_subscription_deserializes_as_none() {
        let event = PaymentEventBuilder::new()
            .event_type("invoice.payment_succeeded")
            .object(json!({"subscription": null}))
            .build();

        let invoice: InvoiceObject = event.deserialize_object().unwrap();
        assert!(invoice.subscription.is_none());
    }

    #[test]
    fn event_type_roundtrip() {
        let types = [
            PaymentEventType::SubscriptionCreated,
            PaymentEventType::SubscriptionUpdated,
            PaymentEventType::SubscriptionDeleted,
            PaymentEventType::InvoicePaymentSucceeded,
            PaymentEventType::InvoicePaymentFailed,
        ];

        for event_type in types {
            assert_eq!(PaymentEventType::from_str(event_type.as_str()), event_type);
        }
    }

    #[test]
    fn unrecognized_event_type_maps_to_unknown() {
        assert_eq!(
            PaymentEventType::from_str("charge.refunded"),
            PaymentEventType::Unknown
        );
    }

    #[test]
    fn to_payload_roundtrips_through_json() {
        let event = PaymentEventBuilder::new().id("evt_payload").build();

        let payload = event.to_payload();
        assert_eq!(payload["id"], "evt_payload");

        let parsed: PaymentEvent = serde_json::from_value(payload).unwrap();
        assert_eq!(parsed.id, "evt_payload");
    }
}
