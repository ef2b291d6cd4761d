//! Role-based limits on suspension terms, keyed by (issuer role, scope).

use std::collections::HashMap;

use boardkeeper_common::{AppError, Role};

use crate::config::SuspensionPolicyConfig;
use crate::models::{ScopeKind, SuspensionTerm};

pub const MIN_SUSPENSION_DAYS: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationRule {
    pub min_days: u32,
    /// `None` means no ceiling.
    pub max_days: Option<u32>,
    pub allow_permanent: bool,
}

#[derive(Debug, Clone)]
pub struct SuspensionPolicy {
    rules: HashMap<(Role, ScopeKind), DurationRule>,
}

impl SuspensionPolicy {
    pub fn new() -> Self {
        Self { rules: HashMap::new() }
    }

    pub fn with_rule(mut self, role: Role, scope: ScopeKind, rule: DurationRule) -> Self {
        self.rules.insert((role, scope), rule);
        self
    }

    pub fn rule(&self, role: Role, scope: ScopeKind) -> Option<&DurationRule> {
        self.rules.get(&(role, scope))
    }

    /// A role may lift early whatever it may issue in the same scope.
    pub fn may_lift(&self, role: Role, scope: ScopeKind) -> bool {
        self.rules.contains_key(&(role, scope))
    }

    /// Rejects a term the issuing role may not hand out in this scope.
    pub fn check(&self, role: Role, scope: ScopeKind, term: SuspensionTerm) -> Result<(), AppError> {
        let rule = self.rule(role, scope).ok_or_else(|| {
            AppError::Forbidden(format!("{} may not issue {:?} suspensions", role, scope))
        })?;

        match term {
            SuspensionTerm::Permanent if !rule.allow_permanent => Err(AppError::Forbidden(format!(
                "{} may not issue permanent {:?} suspensions",
                role, scope
            ))),
            SuspensionTerm::Permanent => Ok(()),
            SuspensionTerm::Days(days) if days < rule.min_days => Err(AppError::Validation(format!(
                "Suspension must last at least {} day(s)",
                rule.min_days
            ))),
            SuspensionTerm::Days(days) => match rule.max_days {
                Some(max) if days > max => Err(AppError::Forbidden(format!(
                    "{} may issue {:?} suspensions of at most {} days",
                    role, scope, max
                ))),
                _ => Ok(()),
            },
        }
    }
}

impl Default for SuspensionPolicy {
    fn default() -> Self {
        Self::from(&SuspensionPolicyConfig::default())
    }
}

impl From<&SuspensionPolicyConfig> for SuspensionPolicy {
    fn from(config: &SuspensionPolicyConfig) -> Self {
        let moderator = DurationRule {
            min_days: MIN_SUSPENSION_DAYS,
            max_days: Some(config.moderator_max_days),
            allow_permanent: false,
        };
        let administrator = DurationRule {
            min_days: MIN_SUSPENSION_DAYS,
            max_days: config.admin_max_days,
            allow_permanent: config.admin_allow_permanent,
        };

        let mut policy = SuspensionPolicy::new()
            .with_rule(Role::Moderator, ScopeKind::Community, moderator)
            .with_rule(Role::Administrator, ScopeKind::Community, administrator)
            .with_rule(Role::Administrator, ScopeKind::Platform, administrator);

        if config.moderator_platform_allowed {
            policy = policy.with_rule(Role::Moderator, ScopeKind::Platform, moderator);
        }

        policy
    }
}
