//! Email adapters - outbound invitation delivery.

mod resend_sender;

pub use resend_sender::ResendEmailSender;
