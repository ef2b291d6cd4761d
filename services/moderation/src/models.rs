use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Duration, Utc};
use validator::Validate;

use boardkeeper_common::{AppError, Principal, Role};

// Content references
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ContentRef {
    Topic(Uuid),
    Reply(Uuid),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Topic,
    Reply,
}

impl ContentRef {
    pub fn id(&self) -> Uuid {
        match self {
            ContentRef::Topic(id) | ContentRef::Reply(id) => *id,
        }
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            ContentRef::Topic(_) => ContentKind::Topic,
            ContentRef::Reply(_) => ContentKind::Reply,
        }
    }
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Topic => "topic",
            ContentKind::Reply => "reply",
        }
    }
}

impl std::fmt::Display for ContentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind().as_str(), self.id())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCategory {
    Spam,
    HateSpeech,
    Harassment,
    Misinformation,
    Threats,
    Doxxing,
    Other,
}

/// The staff member behind a moderation decision. Exactly one of the
/// moderator or administrator identities is ever recorded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "role", content = "id", rename_all = "snake_case")]
pub enum ActingStaff {
    Moderator(Uuid),
    Administrator(Uuid),
}

impl ActingStaff {
    pub fn from_principal(principal: &Principal) -> Result<Self, AppError> {
        match principal.role {
            Role::Moderator => Ok(ActingStaff::Moderator(principal.user_id)),
            Role::Administrator => Ok(ActingStaff::Administrator(principal.user_id)),
            Role::Member => Err(AppError::Forbidden(
                "Only moderators and administrators may perform this operation".to_string(),
            )),
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            ActingStaff::Moderator(id) | ActingStaff::Administrator(id) => *id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            ActingStaff::Moderator(_) => Role::Moderator,
            ActingStaff::Administrator(_) => Role::Administrator,
        }
    }

    pub fn moderator_id(&self) -> Option<Uuid> {
        match self {
            ActingStaff::Moderator(id) => Some(*id),
            ActingStaff::Administrator(_) => None,
        }
    }

    pub fn administrator_id(&self) -> Option<Uuid> {
        match self {
            ActingStaff::Administrator(id) => Some(*id),
            ActingStaff::Moderator(_) => None,
        }
    }
}

// Reporting Models
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Resolved,
    Dismissed,
}

impl ReportStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReportStatus::Pending)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ReportPriority {
    Low,
    Medium,
    High,
}

impl From<ViolationCategory> for ReportPriority {
    fn from(category: ViolationCategory) -> Self {
        match category {
            ViolationCategory::Threats
            | ViolationCategory::Doxxing
            | ViolationCategory::HateSpeech => ReportPriority::High,
            ViolationCategory::Harassment => ReportPriority::Medium,
            _ => ReportPriority::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportOutcome {
    Resolved,
    Dismissed,
}

impl From<ReportOutcome> for ReportStatus {
    fn from(outcome: ReportOutcome) -> Self {
        match outcome {
            ReportOutcome::Resolved => ReportStatus::Resolved,
            ReportOutcome::Dismissed => ReportStatus::Dismissed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub reported_member_id: Uuid,
    pub target: ContentRef,
    pub category: ViolationCategory,
    pub explanation: String,
    pub priority: ReportPriority,
    pub status: ReportStatus,
    pub resolution_notes: Option<String>,
    pub assigned_moderator_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateReportRequest {
    pub target: ContentRef,
    pub category: ViolationCategory,
    #[validate(length(min = 1, max = 2000, message = "explanation must be 1-2000 characters"))]
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResolveReportRequest {
    pub outcome: ReportOutcome,
    #[validate(length(max = 2000, message = "notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportQuery {
    pub status: Option<ReportStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

// Moderation Action Models
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    HideContent,
    DeleteContent,
    IssueWarning,
    SuspendUser,
    BanUser,
    RestoreContent,
    DismissReport,
    Remove,
}

impl ActionType {
    /// Actions that are expected to be followed by a suspension or ban.
    pub fn is_sanction(&self) -> bool {
        matches!(self, ActionType::SuspendUser | ActionType::BanUser)
    }

    pub fn changes_content(&self) -> bool {
        matches!(
            self,
            ActionType::HideContent | ActionType::DeleteContent | ActionType::RestoreContent
        )
    }
}

/// Audit record of an enforcement decision. Never mutated after creation;
/// reversal is tracked separately by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModerationAction {
    pub id: Uuid,
    pub actor: ActingStaff,
    pub target_member_id: Uuid,
    pub related_report_id: Option<Uuid>,
    pub content_ref: Option<ContentRef>,
    pub action_type: ActionType,
    pub reason: String,
    pub category: ViolationCategory,
    pub content_snapshot: Option<String>,
    pub reputation_penalty: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Reversal {
    pub reversed_at: DateTime<Utc>,
    pub appeal_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModerationActionView {
    #[serde(flatten)]
    pub action: ModerationAction,
    pub moderator_id: Option<Uuid>,
    pub administrator_id: Option<Uuid>,
    pub is_reversed: bool,
    pub reversed_at: Option<DateTime<Utc>>,
}

impl ModerationActionView {
    pub fn new(action: ModerationAction, reversal: Option<&Reversal>) -> Self {
        Self {
            moderator_id: action.actor.moderator_id(),
            administrator_id: action.actor.administrator_id(),
            is_reversed: reversal.is_some(),
            reversed_at: reversal.map(|r| r.reversed_at),
            action,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateActionRequest {
    pub target_member_id: Uuid,
    pub action_type: ActionType,
    #[validate(length(max = 5000, message = "reason must be at most 5000 characters"))]
    pub reason: String,
    pub category: ViolationCategory,
    pub content_snapshot: Option<String>,
    pub related_report_id: Option<Uuid>,
    pub content_ref: Option<ContentRef>,
    #[validate(range(min = -1_000_000, max = 1_000_000, message = "reputation_penalty must be within 1,000,000 points"))]
    pub reputation_penalty: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionQuery {
    pub member_id: Option<Uuid>,
    pub action_type: Option<ActionType>,
    pub reversed: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

// Suspension Models
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Community,
    Platform,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SuspensionScope {
    Community { community_id: Uuid },
    Platform,
}

impl SuspensionScope {
    pub fn kind(&self) -> ScopeKind {
        match self {
            SuspensionScope::Community { .. } => ScopeKind::Community,
            SuspensionScope::Platform => ScopeKind::Platform,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SuspensionTerm {
    Days(u32),
    Permanent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SuspensionState {
    Active,
    Expired {
        expired_at: DateTime<Utc>,
    },
    LiftedEarly {
        lifted_at: DateTime<Utc>,
        lifted_reason: String,
        lifted_by: Option<Uuid>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Suspension {
    pub id: Uuid,
    pub member_id: Uuid,
    pub issued_by: ActingStaff,
    pub moderation_action_id: Option<Uuid>,
    pub scope: SuspensionScope,
    pub reason_category: ViolationCategory,
    pub reason: String,
    pub duration_days: Option<u32>,
    pub is_permanent: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub state: SuspensionState,
    pub internal_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn end_of_term(start: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>, AppError> {
    Duration::try_days(i64::from(days))
        .and_then(|term| start.checked_add_signed(term))
        .ok_or_else(|| {
            AppError::Validation(format!("Suspension of {} days ends outside the supported calendar", days))
        })
}

impl Suspension {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        member_id: Uuid,
        issued_by: ActingStaff,
        scope: SuspensionScope,
        term: SuspensionTerm,
        reason_category: ViolationCategory,
        reason: String,
        moderation_action_id: Option<Uuid>,
        internal_notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        let (duration_days, end_date) = match term {
            SuspensionTerm::Days(days) => (Some(days), Some(end_of_term(now, days)?)),
            SuspensionTerm::Permanent => (None, None),
        };

        Ok(Self {
            id: Uuid::new_v4(),
            member_id,
            issued_by,
            moderation_action_id,
            scope,
            reason_category,
            reason,
            duration_days,
            is_permanent: matches!(term, SuspensionTerm::Permanent),
            start_date: now,
            end_date,
            state: SuspensionState::Active,
            internal_notes,
            created_at: now,
            updated_at: now,
        })
    }

    /// Still marked active but past its end date.
    pub fn has_lapsed(&self, now: DateTime<Utc>) -> bool {
        matches!(self.state, SuspensionState::Active)
            && self.end_date.map_or(false, |end| end <= now)
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.state, SuspensionState::Active) && !self.has_lapsed(now)
    }

    /// Records natural expiry. Returns false if the suspension was not due.
    pub fn expire(&mut self, now: DateTime<Utc>) -> bool {
        if !self.has_lapsed(now) {
            return false;
        }
        // Expiry is stamped with the end date, not the time it was noticed
        let expired_at = self.end_date.unwrap_or(now);
        self.state = SuspensionState::Expired { expired_at };
        self.updated_at = now;
        true
    }

    pub fn observe(&self, now: DateTime<Utc>) -> SuspensionView {
        let (lifted_at, lifted_reason) = match &self.state {
            SuspensionState::LiftedEarly { lifted_at, lifted_reason, .. } => {
                (Some(*lifted_at), Some(lifted_reason.clone()))
            }
            _ => (None, None),
        };
        let expired_at = match &self.state {
            SuspensionState::Expired { expired_at } => Some(*expired_at),
            SuspensionState::Active if self.has_lapsed(now) => self.end_date,
            _ => None,
        };

        SuspensionView {
            id: self.id,
            member_id: self.member_id,
            issued_by: self.issued_by,
            moderation_action_id: self.moderation_action_id,
            scope: self.scope,
            reason_category: self.reason_category,
            reason: self.reason.clone(),
            duration_days: self.duration_days,
            is_permanent: self.is_permanent,
            start_date: self.start_date,
            end_date: self.end_date,
            is_active: self.is_active_at(now),
            lifted_early: lifted_at.is_some(),
            lifted_at,
            lifted_reason,
            expired_at,
            internal_notes: self.internal_notes.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuspensionView {
    pub id: Uuid,
    pub member_id: Uuid,
    pub issued_by: ActingStaff,
    pub moderation_action_id: Option<Uuid>,
    pub scope: SuspensionScope,
    pub reason_category: ViolationCategory,
    pub reason: String,
    pub duration_days: Option<u32>,
    pub is_permanent: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub lifted_early: bool,
    pub lifted_at: Option<DateTime<Utc>>,
    pub lifted_reason: Option<String>,
    pub expired_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SuspensionView {
    /// Strips staff-only fields before showing the record to the member.
    pub fn redacted(mut self) -> Self {
        self.internal_notes = None;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSuspensionRequest {
    pub member_id: Uuid,
    pub scope: SuspensionScope,
    pub term: SuspensionTerm,
    pub reason_category: ViolationCategory,
    #[validate(length(min = 1, max = 2000, message = "reason must be 1-2000 characters"))]
    pub reason: String,
    pub moderation_action_id: Option<Uuid>,
    #[validate(length(max = 5000))]
    pub internal_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LiftSuspensionRequest {
    #[validate(length(min = 1, max = 2000, message = "reason must be 1-2000 characters"))]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuspensionQuery {
    pub active: Option<bool>,
}

// Appeal Models
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppealType {
    ContentRemoval,
    Suspension,
    Ban,
    Warning,
    PolicyReviewRequest,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppealStatus {
    Pending,
    Upheld,
    Overturned,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppealDecision {
    Uphold,
    Overturn,
}

impl AppealDecision {
    pub fn status(&self) -> AppealStatus {
        match self {
            AppealDecision::Uphold => AppealStatus::Upheld,
            AppealDecision::Overturn => AppealStatus::Overturned,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub reviewer: ActingStaff,
    pub decision: AppealDecision,
    pub explanation: String,
    pub reviewed_at: DateTime<Utc>,
}

/// Two-tier review: a first decision, then at most one administrator review
/// after the appellant escalates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum AppealStage {
    AwaitingReview,
    Decided {
        review: Review,
    },
    Escalated {
        first_review: Review,
        escalated_at: DateTime<Utc>,
    },
    Resolved {
        first_review: Review,
        escalated_at: DateTime<Utc>,
        final_review: Review,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appeal {
    pub id: Uuid,
    pub moderation_action_id: Uuid,
    pub appellant_id: Uuid,
    pub appeal_type: AppealType,
    pub appeal_text: String,
    pub stage: AppealStage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appeal {
    pub fn latest_review(&self) -> Option<&Review> {
        match &self.stage {
            AppealStage::AwaitingReview => None,
            AppealStage::Decided { review } => Some(review),
            AppealStage::Escalated { first_review, .. } => Some(first_review),
            AppealStage::Resolved { final_review, .. } => Some(final_review),
        }
    }

    pub fn status(&self) -> AppealStatus {
        self.latest_review()
            .map(|review| review.decision.status())
            .unwrap_or(AppealStatus::Pending)
    }

    pub fn is_escalated(&self) -> bool {
        matches!(
            self.stage,
            AppealStage::Escalated { .. } | AppealStage::Resolved { .. }
        )
    }

    /// Awaiting a decision at either tier.
    pub fn is_open(&self) -> bool {
        matches!(
            self.stage,
            AppealStage::AwaitingReview | AppealStage::Escalated { .. }
        )
    }

    pub fn is_fully_resolved(&self) -> bool {
        match &self.stage {
            AppealStage::Decided { review } => review.reviewer.role() == Role::Administrator,
            AppealStage::Resolved { .. } => true,
            _ => false,
        }
    }

    pub fn view(&self) -> AppealView {
        let latest = self.latest_review();
        let escalated_at = match &self.stage {
            AppealStage::Escalated { escalated_at, .. }
            | AppealStage::Resolved { escalated_at, .. } => Some(*escalated_at),
            _ => None,
        };
        let review_history = match &self.stage {
            AppealStage::AwaitingReview => Vec::new(),
            AppealStage::Decided { review } => vec![review.clone()],
            AppealStage::Escalated { first_review, .. } => vec![first_review.clone()],
            AppealStage::Resolved { first_review, final_review, .. } => {
                vec![first_review.clone(), final_review.clone()]
            }
        };

        AppealView {
            id: self.id,
            moderation_action_id: self.moderation_action_id,
            appellant_id: self.appellant_id,
            appeal_type: self.appeal_type,
            appeal_text: self.appeal_text.clone(),
            status: self.status(),
            decision_explanation: latest.map(|r| r.explanation.clone()),
            reviewer: latest.map(|r| r.reviewer),
            reviewed_at: latest.map(|r| r.reviewed_at),
            is_escalated: self.is_escalated(),
            escalated_at,
            is_fully_resolved: self.is_fully_resolved(),
            review_history,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppealView {
    pub id: Uuid,
    pub moderation_action_id: Uuid,
    pub appellant_id: Uuid,
    pub appeal_type: AppealType,
    pub appeal_text: String,
    pub status: AppealStatus,
    pub decision_explanation: Option<String>,
    pub reviewer: Option<ActingStaff>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub is_escalated: bool,
    pub escalated_at: Option<DateTime<Utc>>,
    pub is_fully_resolved: bool,
    pub review_history: Vec<Review>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitAppealRequest {
    pub moderation_action_id: Uuid,
    pub appeal_type: AppealType,
    #[validate(length(min = 1, max = 5000, message = "appeal_text must be 1-5000 characters"))]
    pub appeal_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReviewAppealRequest {
    pub decision: AppealDecision,
    #[validate(length(min = 1, max = 5000, message = "explanation must be 1-5000 characters"))]
    pub explanation: String,
}

// Reputation Models
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VoteType {
    Upvote,
    Downvote,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vote {
    pub voter_id: Uuid,
    pub target: ContentRef,
    pub owner_id: Uuid,
    pub vote_type: VoteType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PenaltyEntry {
    pub member_id: Uuid,
    pub delta: i64,
    pub moderation_action_id: Option<Uuid>,
    pub reason: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReputationRecord {
    pub member_id: Uuid,
    pub topics_score: i64,
    pub replies_score: i64,
    pub upvotes_received: u64,
    pub downvotes_received: u64,
    pub total_score: i64,
    pub moderation_adjustment: i64,
    pub effective_score: i64,
    pub last_recomputed_at: DateTime<Utc>,
}

impl ReputationRecord {
    pub fn new(member_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            member_id,
            topics_score: 0,
            replies_score: 0,
            upvotes_received: 0,
            downvotes_received: 0,
            total_score: 0,
            moderation_adjustment: 0,
            effective_score: 0,
            last_recomputed_at: now,
        }
    }

    /// Re-derives the totals; the only place they are written.
    pub fn refresh_totals(&mut self, now: DateTime<Utc>) {
        self.total_score = self.topics_score + self.replies_score;
        self.effective_score = self.total_score + self.moderation_adjustment;
        self.last_recomputed_at = now;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordVoteRequest {
    pub target: ContentRef,
    pub vote_type: VoteType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteOutcome {
    pub vote: Vote,
    pub owner_reputation: ReputationRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PenaltyRequest {
    #[validate(range(min = -1_000_000, max = 1_000_000, message = "delta must be within 1,000,000 points"))]
    pub delta: i64,
    #[validate(length(min = 1, max = 2000, message = "reason must be 1-2000 characters"))]
    pub reason: String,
    pub moderation_action_id: Option<Uuid>,
}

// Standing & analytics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberStanding {
    pub member_id: Uuid,
    pub active_suspensions: Vec<SuspensionView>,
    pub actions_in_force: usize,
    pub warnings_in_force: usize,
    pub actions_reversed: usize,
    pub open_appeals: usize,
    pub reputation: ReputationRecord,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModerationStats {
    pub reports_pending: usize,
    pub reports_resolved: usize,
    pub reports_dismissed: usize,
    pub actions_total: usize,
    pub actions_reversed: usize,
    pub suspensions_active: usize,
    pub appeals_pending: usize,
    pub appeals_upheld: usize,
    pub appeals_overturned: usize,
    pub appeals_escalated: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suspension(term: SuspensionTerm, now: DateTime<Utc>) -> Suspension {
        Suspension::new(
            Uuid::new_v4(),
            ActingStaff::Moderator(Uuid::new_v4()),
            SuspensionScope::Platform,
            term,
            ViolationCategory::Harassment,
            "repeated harassment".to_string(),
            None,
            None,
            now,
        )
        .expect("suspension")
    }

    #[test]
    fn test_end_date_is_start_plus_duration() {
        let now = Utc::now();
        let s = suspension(SuspensionTerm::Days(7), now);
        assert_eq!(s.end_date, Some(s.start_date + Duration::days(7)));
        assert!(!s.is_permanent);
    }

    #[test]
    fn test_permanent_has_no_end() {
        let s = suspension(SuspensionTerm::Permanent, Utc::now());
        assert!(s.is_permanent);
        assert_eq!(s.duration_days, None);
        assert_eq!(s.end_date, None);
        assert!(s.is_active_at(Utc::now() + Duration::days(10_000)));
    }

    #[test]
    fn test_term_past_the_calendar_is_rejected() {
        let result = Suspension::new(
            Uuid::new_v4(),
            ActingStaff::Administrator(Uuid::new_v4()),
            SuspensionScope::Platform,
            SuspensionTerm::Days(u32::MAX),
            ViolationCategory::Harassment,
            "repeated harassment".to_string(),
            None,
            None,
            Utc::now(),
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_lapse_is_visible_before_sweep() {
        let now = Utc::now();
        let mut s = suspension(SuspensionTerm::Days(3), now);
        let later = now + Duration::days(4);

        let view = s.observe(later);
        assert!(!view.is_active);
        assert!(!view.lifted_early);
        assert_eq!(view.expired_at, s.end_date);

        assert!(s.expire(later));
        assert!(!s.expire(later));
        assert!(!s.observe(later).is_active);
    }

    #[test]
    fn test_content_ref_wire_shape() {
        let id = Uuid::new_v4();
        let json = serde_json::to_value(ContentRef::Reply(id)).expect("serialize");
        assert_eq!(json["kind"], "reply");
        assert_eq!(json["id"], id.to_string());
    }

    #[test]
    fn test_priority_from_category() {
        assert_eq!(ReportPriority::from(ViolationCategory::Doxxing), ReportPriority::High);
        assert_eq!(ReportPriority::from(ViolationCategory::Harassment), ReportPriority::Medium);
        assert_eq!(ReportPriority::from(ViolationCategory::Spam), ReportPriority::Low);
    }
}
