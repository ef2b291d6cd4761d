#![allow(dead_code)]

use std::sync::Arc;

use uuid::Uuid;

use boardkeeper_common::{JwtConfig, Principal, RedisConfig, ServerConfig};
use boardkeeper_moderation::{
    audit::RecordingAuditSink,
    config::{DirectoryConfig, ModerationConfig, ModerationRules, SuspensionPolicyConfig},
    directory::InMemoryDirectory,
    models::{
        ActionType, ContentRef, CreateActionRequest, ModerationActionView, RecordVoteRequest,
        ViolationCategory, VoteType,
    },
    AppState,
};

pub const REASON: &str = "Posting the same advertisement in every forum section";

pub fn test_config() -> ModerationConfig {
    ModerationConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["http://localhost:3000".to_string()],
        },
        redis: RedisConfig {
            enabled: false,
            host: "localhost".to_string(),
            port: 6379,
            password: None,
            database: 4,
        },
        jwt: JwtConfig {
            secret: "test-secret".to_string(),
            expiration_hours: 1,
            issuer: "boardkeeper".to_string(),
        },
        rules: ModerationRules::default(),
        suspension_policy: SuspensionPolicyConfig::default(),
        directory: DirectoryConfig {
            base_url: None,
            timeout_seconds: 5,
        },
    }
}

/// Services wired over an in-memory directory and a recording audit sink.
pub struct Harness {
    pub state: AppState,
    pub directory: InMemoryDirectory,
    pub audit: RecordingAuditSink,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: ModerationConfig) -> Self {
        let directory = InMemoryDirectory::new();
        let audit = RecordingAuditSink::new();
        let state = AppState::new(config, Arc::new(directory.clone()), Arc::new(audit.clone()));

        Self {
            state,
            directory,
            audit,
        }
    }

    pub fn member(&self) -> Principal {
        let id = Uuid::new_v4();
        self.directory.add_member(id);
        Principal::member(id)
    }

    pub fn moderator(&self) -> Principal {
        let id = Uuid::new_v4();
        self.directory.add_member(id);
        Principal::moderator(id)
    }

    pub fn administrator(&self) -> Principal {
        let id = Uuid::new_v4();
        self.directory.add_member(id);
        Principal::administrator(id)
    }

    pub fn topic_by(&self, owner: &Principal) -> ContentRef {
        let target = ContentRef::Topic(Uuid::new_v4());
        self.directory.add_content(target, owner.user_id, "Buy cheap watches at my store");
        target
    }

    pub fn reply_by(&self, owner: &Principal) -> ContentRef {
        let target = ContentRef::Reply(Uuid::new_v4());
        self.directory.add_content(target, owner.user_id, "Agreed, see my store for more");
        target
    }

    /// Gives `member` `count` topic upvotes from fresh voters.
    pub async fn upvote_topics(&self, member: &Principal, count: usize) {
        for _ in 0..count {
            let voter = self.member();
            let topic = self.topic_by(member);
            self.state
                .reputation_service
                .record_vote(
                    &voter,
                    RecordVoteRequest {
                        target: topic,
                        vote_type: VoteType::Upvote,
                    },
                )
                .await
                .expect("upvote");
        }
    }

    pub async fn act(
        &self,
        staff: &Principal,
        target: &Principal,
        action_type: ActionType,
        content_ref: Option<ContentRef>,
    ) -> ModerationActionView {
        self.state
            .moderation_engine
            .execute_moderation_action(staff, action_request(target, action_type, content_ref))
            .await
            .expect("moderation action")
    }
}

pub fn action_request(
    target: &Principal,
    action_type: ActionType,
    content_ref: Option<ContentRef>,
) -> CreateActionRequest {
    CreateActionRequest {
        target_member_id: target.user_id,
        action_type,
        reason: REASON.to_string(),
        category: ViolationCategory::Spam,
        content_snapshot: None,
        related_report_id: None,
        content_ref,
        reputation_penalty: None,
    }
}
