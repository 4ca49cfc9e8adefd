//! Access Engine - Invitation and Access Consistency for Skillbridge
//!
//! This crate implements single-use invitation tokens, atomic redemption
//! into memberships, subscription-status propagation from payment webhooks,
//! and enrollment provisioning for newly active members.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
