use boardkeeper_common::{env_opt, env_or, JwtConfig, RedisConfig, ServerConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationConfig {
    pub server: ServerConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub rules: ModerationRules,
    pub suspension_policy: SuspensionPolicyConfig,
    pub directory: DirectoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationRules {
    pub min_reason_length: usize,
    pub downvote_threshold: i64,
    pub weights: VoteWeights,
    pub sweep_interval_seconds: u64,
    pub audit_channel: String,
}

/// Points awarded (upvotes) or deducted (downvotes) per vote.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteWeights {
    pub topic_upvote: i64,
    pub topic_downvote: i64,
    pub reply_upvote: i64,
    pub reply_downvote: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspensionPolicyConfig {
    pub moderator_max_days: u32,
    pub moderator_platform_allowed: bool,
    pub admin_max_days: Option<u32>,
    pub admin_allow_permanent: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    pub base_url: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for ModerationRules {
    fn default() -> Self {
        Self {
            min_reason_length: 20,
            downvote_threshold: 50,
            weights: VoteWeights::default(),
            sweep_interval_seconds: 60,
            audit_channel: "moderation.audit".to_string(),
        }
    }
}

impl Default for VoteWeights {
    fn default() -> Self {
        Self {
            topic_upvote: 5,
            topic_downvote: 2,
            reply_upvote: 2,
            reply_downvote: 1,
        }
    }
}

impl Default for SuspensionPolicyConfig {
    fn default() -> Self {
        Self {
            moderator_max_days: 30,
            moderator_platform_allowed: true,
            admin_max_days: None,
            admin_allow_permanent: true,
        }
    }
}

impl ModerationConfig {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let rule_defaults = ModerationRules::default();
        let weight_defaults = VoteWeights::default();
        let policy_defaults = SuspensionPolicyConfig::default();

        let config = Self {
            server: ServerConfig {
                host: std::env::var("MODERATION_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env_or("MODERATION_PORT", 8007),
                cors_origins: std::env::var("CORS_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
            },
            redis: RedisConfig {
                enabled: env_or("AUDIT_REDIS_ENABLED", false),
                host: std::env::var("REDIS_HOST").unwrap_or_else(|_| "localhost".to_string()),
                port: env_or("REDIS_PORT", 6379),
                password: std::env::var("REDIS_PASSWORD").ok().filter(|p| !p.is_empty()),
                database: env_or("REDIS_DATABASE", 4),
            },
            jwt: JwtConfig {
                secret: std::env::var("JWT_SECRET")
                    .unwrap_or_else(|_| "dev-secret-key-change-in-production".to_string()),
                expiration_hours: env_or("JWT_EXPIRATION_HOURS", 24),
                issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "boardkeeper".to_string()),
            },
            rules: ModerationRules {
                min_reason_length: env_or("MODERATION_MIN_REASON_LENGTH", rule_defaults.min_reason_length),
                downvote_threshold: env_or("REPUTATION_DOWNVOTE_THRESHOLD", rule_defaults.downvote_threshold),
                weights: VoteWeights {
                    topic_upvote: env_or("REPUTATION_TOPIC_UPVOTE_WEIGHT", weight_defaults.topic_upvote),
                    topic_downvote: env_or("REPUTATION_TOPIC_DOWNVOTE_WEIGHT", weight_defaults.topic_downvote),
                    reply_upvote: env_or("REPUTATION_REPLY_UPVOTE_WEIGHT", weight_defaults.reply_upvote),
                    reply_downvote: env_or("REPUTATION_REPLY_DOWNVOTE_WEIGHT", weight_defaults.reply_downvote),
                },
                sweep_interval_seconds: env_or(
                    "SUSPENSION_SWEEP_INTERVAL_SECONDS",
                    rule_defaults.sweep_interval_seconds,
                ),
                audit_channel: std::env::var("MODERATION_AUDIT_CHANNEL")
                    .unwrap_or(rule_defaults.audit_channel),
            },
            suspension_policy: SuspensionPolicyConfig {
                moderator_max_days: env_or("SUSPENSION_MODERATOR_MAX_DAYS", policy_defaults.moderator_max_days),
                moderator_platform_allowed: env_or(
                    "SUSPENSION_MODERATOR_PLATFORM",
                    policy_defaults.moderator_platform_allowed,
                ),
                admin_max_days: env_opt("SUSPENSION_ADMIN_MAX_DAYS"),
                admin_allow_permanent: env_or(
                    "SUSPENSION_ADMIN_ALLOW_PERMANENT",
                    policy_defaults.admin_allow_permanent,
                ),
            },
            directory: DirectoryConfig {
                base_url: std::env::var("CONTENT_SERVICE_URL").ok().filter(|u| !u.is_empty()),
                timeout_seconds: env_or("CONTENT_SERVICE_TIMEOUT_SECONDS", 5),
            },
        };

        if config.rules.sweep_interval_seconds == 0 {
            return Err("SUSPENSION_SWEEP_INTERVAL_SECONDS must be positive".into());
        }

        Ok(config)
    }
}
