use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;
use validator::Validate;

use boardkeeper_common::{AppError, Principal, Role};
use crate::{
    audit::{deliver, AuditEvent, AuditSink},
    config::VoteWeights,
    directory::Directory,
    models::{
        ContentKind, ContentRef, PenaltyEntry, PenaltyRequest, RecordVoteRequest,
        ReputationRecord, Vote, VoteOutcome, VoteType,
    },
};

/// Everything that feeds one member's score. Guarded by a per-member lock so
/// concurrent votes on the same member's content cannot lose updates.
struct MemberLedger {
    record: ReputationRecord,
    votes: HashMap<(Uuid, ContentRef), Vote>,
    penalties: Vec<PenaltyEntry>,
}

impl MemberLedger {
    fn new(member_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            record: ReputationRecord::new(member_id, now),
            votes: HashMap::new(),
            penalties: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct ReputationService {
    ledgers: Arc<DashMap<Uuid, Arc<Mutex<MemberLedger>>>>,
    directory: Arc<dyn Directory>,
    audit: Arc<dyn AuditSink>,
    weights: VoteWeights,
    downvote_threshold: i64,
}

impl ReputationService {
    pub fn new(
        directory: Arc<dyn Directory>,
        audit: Arc<dyn AuditSink>,
        weights: VoteWeights,
        downvote_threshold: i64,
    ) -> Self {
        Self {
            ledgers: Arc::new(DashMap::new()),
            directory,
            audit,
            weights,
            downvote_threshold,
        }
    }

    fn ledger(&self, member_id: Uuid) -> Arc<Mutex<MemberLedger>> {
        self.ledgers
            .entry(member_id)
            .or_insert_with(|| Arc::new(Mutex::new(MemberLedger::new(member_id, Utc::now()))))
            .clone()
    }

    fn existing_ledger(&self, member_id: Uuid) -> Option<Arc<Mutex<MemberLedger>>> {
        self.ledgers.get(&member_id).map(|entry| entry.value().clone())
    }

    /// Signed (topics, replies) contribution of one vote.
    fn contribution(&self, kind: ContentKind, vote_type: VoteType) -> (i64, i64) {
        match (kind, vote_type) {
            (ContentKind::Topic, VoteType::Upvote) => (self.weights.topic_upvote, 0),
            (ContentKind::Topic, VoteType::Downvote) => (-self.weights.topic_downvote, 0),
            (ContentKind::Reply, VoteType::Upvote) => (0, self.weights.reply_upvote),
            (ContentKind::Reply, VoteType::Downvote) => (0, -self.weights.reply_downvote),
        }
    }

    fn apply_vote(&self, record: &mut ReputationRecord, kind: ContentKind, vote_type: VoteType, sign: i64) {
        let (topics, replies) = self.contribution(kind, vote_type);
        record.topics_score += sign * topics;
        record.replies_score += sign * replies;

        let counter = match vote_type {
            VoteType::Upvote => &mut record.upvotes_received,
            VoteType::Downvote => &mut record.downvotes_received,
        };
        *counter = if sign > 0 { *counter + 1 } else { counter.saturating_sub(1) };
    }

    pub async fn get_reputation(&self, member_id: Uuid) -> ReputationRecord {
        match self.existing_ledger(member_id) {
            Some(ledger) => ledger.lock().await.record.clone(),
            None => ReputationRecord::new(member_id, Utc::now()),
        }
    }

    /// Creates or changes the caller's vote on a piece of content and folds
    /// the difference into the content owner's score.
    pub async fn record_vote(
        &self,
        voter: &Principal,
        request: RecordVoteRequest,
    ) -> Result<VoteOutcome, AppError> {
        let content = self.directory.require_content(request.target).await?;
        let owner_id = content.owner_id;

        if owner_id == voter.user_id {
            return Err(AppError::Forbidden("Members cannot vote on their own content".to_string()));
        }

        if request.vote_type == VoteType::Downvote {
            let voter_score = self.get_reputation(voter.user_id).await.total_score;
            if voter_score < self.downvote_threshold {
                tracing::warn!(
                    "Downvote by {} rejected: score {} below {}",
                    voter.user_id, voter_score, self.downvote_threshold
                );
                return Err(AppError::Forbidden(format!(
                    "Downvoting requires a reputation of at least {}",
                    self.downvote_threshold
                )));
            }
        }

        let ledger = self.ledger(owner_id);
        let mut ledger = ledger.lock().await;
        let now = Utc::now();
        let key = (voter.user_id, request.target);
        let kind = request.target.kind();

        let previous = ledger.votes.get(&key).map(|vote| vote.vote_type);
        match previous {
            Some(previous) if previous == request.vote_type => {
                tracing::debug!("Vote by {} on {} unchanged", voter.user_id, request.target);
            }
            _ => {
                let MemberLedger { record, votes, .. } = &mut *ledger;
                if let Some(previous) = previous {
                    self.apply_vote(record, kind, previous, -1);
                }
                self.apply_vote(record, kind, request.vote_type, 1);
                record.refresh_totals(now);

                let vote = votes.entry(key).or_insert_with(|| Vote {
                    voter_id: voter.user_id,
                    target: request.target,
                    owner_id,
                    vote_type: request.vote_type,
                    created_at: now,
                    updated_at: now,
                });
                vote.vote_type = request.vote_type;
                vote.updated_at = now;

                tracing::info!(
                    "{:?} by {} on {}, owner {} now at {}",
                    request.vote_type, voter.user_id, request.target, owner_id, record.total_score
                );
            }
        }

        let vote = ledger
            .votes
            .get(&key)
            .cloned()
            .ok_or_else(|| AppError::Internal("Vote missing after upsert".to_string()))?;

        Ok(VoteOutcome {
            vote,
            owner_reputation: ledger.record.clone(),
        })
    }

    /// Administrator path for a direct karma adjustment.
    pub async fn apply_penalty(
        &self,
        principal: &Principal,
        member_id: Uuid,
        request: PenaltyRequest,
    ) -> Result<ReputationRecord, AppError> {
        if principal.role != Role::Administrator {
            return Err(AppError::Forbidden(
                "Only administrators may adjust reputation directly".to_string(),
            ));
        }
        request.validate()?;
        self.directory.require_member(member_id).await?;

        self.record_moderation_penalty(member_id, request.delta, request.reason, request.moderation_action_id)
            .await
    }

    /// Adds an attributed adjustment kept apart from the vote-derived scores.
    pub async fn record_moderation_penalty(
        &self,
        member_id: Uuid,
        delta: i64,
        reason: String,
        moderation_action_id: Option<Uuid>,
    ) -> Result<ReputationRecord, AppError> {
        if delta == 0 {
            return Err(AppError::Validation("Penalty delta must be non-zero".to_string()));
        }

        let now = Utc::now();
        let record = {
            let ledger = self.ledger(member_id);
            let mut ledger = ledger.lock().await;
            let adjustment = ledger
                .record
                .moderation_adjustment
                .checked_add(delta)
                .filter(|adjustment| ledger.record.total_score.checked_add(*adjustment).is_some())
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "Adjustment of {} would overflow the reputation of {}",
                        delta, member_id
                    ))
                })?;
            ledger.penalties.push(PenaltyEntry {
                member_id,
                delta,
                moderation_action_id,
                reason,
                recorded_at: now,
            });
            ledger.record.moderation_adjustment = adjustment;
            ledger.record.refresh_totals(now);
            ledger.record.clone()
        };

        tracing::info!(
            "Reputation adjustment {} for {} (action {:?})",
            delta, member_id, moderation_action_id
        );
        deliver(
            self.audit.as_ref(),
            AuditEvent::ReputationPenalty {
                member_id,
                delta,
                moderation_action_id,
                recorded_at: now,
            },
        )
        .await;

        Ok(record)
    }

    /// Cancels whatever adjustments are still attributed to a reversed action.
    pub async fn compensate_action(
        &self,
        member_id: Uuid,
        moderation_action_id: Uuid,
    ) -> Result<Option<ReputationRecord>, AppError> {
        let Some(ledger) = self.existing_ledger(member_id) else {
            return Ok(None);
        };

        let outstanding = ledger
            .lock()
            .await
            .penalties
            .iter()
            .filter(|p| p.moderation_action_id == Some(moderation_action_id))
            .try_fold(0i64, |sum, p| sum.checked_add(p.delta))
            .and_then(i64::checked_neg)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Adjustments attributed to action {} cannot be compensated",
                    moderation_action_id
                ))
            })?;

        if outstanding == 0 {
            return Ok(None);
        }

        let record = self
            .record_moderation_penalty(
                member_id,
                outstanding,
                format!("Reversal of moderation action {}", moderation_action_id),
                Some(moderation_action_id),
            )
            .await?;
        Ok(Some(record))
    }

    pub async fn penalties(&self, member_id: Uuid) -> Vec<PenaltyEntry> {
        match self.existing_ledger(member_id) {
            Some(ledger) => ledger.lock().await.penalties.clone(),
            None => Vec::new(),
        }
    }

    /// Rebuilds a member's record from the full vote and penalty history and
    /// stores it. Must agree with the incrementally maintained record.
    pub async fn recompute(&self, member_id: Uuid) -> ReputationRecord {
        let Some(ledger) = self.existing_ledger(member_id) else {
            return ReputationRecord::new(member_id, Utc::now());
        };
        let mut ledger = ledger.lock().await;
        let now = Utc::now();

        let mut record = ReputationRecord::new(member_id, now);
        for vote in ledger.votes.values() {
            self.apply_vote(&mut record, vote.target.kind(), vote.vote_type, 1);
        }
        record.moderation_adjustment = ledger.penalties.iter().map(|p| p.delta).sum();
        record.refresh_totals(now);

        if record.total_score != ledger.record.total_score
            || record.moderation_adjustment != ledger.record.moderation_adjustment
        {
            tracing::warn!(
                "Reputation drift for {}: incremental {} vs recomputed {}",
                member_id, ledger.record.total_score, record.total_score
            );
        }

        ledger.record = record.clone();
        record
    }
}
