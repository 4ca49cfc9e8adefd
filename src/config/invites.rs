//! Invitation policy configuration.

use serde::Deserialize;

use super::error::ValidationError;

/// Invitation lifetimes and limits.
#[derive(Debug, Clone, Deserialize)]
pub struct InviteConfig {
    /// Days a company-employee invitation stays redeemable.
    #[serde(default = "default_employee_ttl_days")]
    pub employee_ttl_days: u32,

    /// Days a team invitation stays redeemable.
    #[serde(default = "default_team_ttl_days")]
    pub team_ttl_days: u32,

    /// Concurrent invited-or-active member cap for team organizations.
    #[serde(default = "default_team_member_cap")]
    pub team_member_cap: u32,

    /// Base URL that invitation links are built on.
    #[serde(default = "default_invite_link_base")]
    pub link_base: String,
}

fn default_employee_ttl_days() -> u32 {
    7
}

fn default_team_ttl_days() -> u32 {
    7
}

fn default_team_member_cap() -> u32 {
    10
}

fn default_invite_link_base() -> String {
    "https://app.skillbridge.example".to_string()
}

impl Default for InviteConfig {
    fn default() -> Self {
        Self {
            employee_ttl_days: default_employee_ttl_days(),
            team_ttl_days: default_team_ttl_days(),
            team_member_cap: default_team_member_cap(),
            link_base: default_invite_link_base(),
        }
    }
}

impl InviteConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.employee_ttl_days == 0 || self.team_ttl_days == 0 {
            return Err(ValidationError::InvalidInviteLifetime);
        }
        if self.team_member_cap == 0 {
            return Err(ValidationError::InvalidMemberCap);
        }
        if !self.link_base.starts_with("http://") && !self.link_base.starts_with("https://") {
            return Err(ValidationError::InvalidInviteLinkBase);
        }
        Ok(())
    }
}
