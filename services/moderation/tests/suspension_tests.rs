mod common;

use chrono::{Duration, Utc};
use futures::future::join_all;
use uuid::Uuid;

use boardkeeper_common::{AppError, Principal};
use boardkeeper_moderation::models::{
    ActionType, CreateSuspensionRequest, SuspensionQuery, SuspensionScope, SuspensionTerm,
    ViolationCategory,
};

use common::{test_config, Harness};

fn suspension_request(member: &Principal, scope: SuspensionScope, term: SuspensionTerm) -> CreateSuspensionRequest {
    CreateSuspensionRequest {
        member_id: member.user_id,
        scope,
        term,
        reason_category: ViolationCategory::Harassment,
        reason: "Repeated harassment after warnings".to_string(),
        moderation_action_id: None,
        internal_notes: Some("Third incident this month".to_string()),
    }
}

fn community() -> SuspensionScope {
    SuspensionScope::Community {
        community_id: Uuid::new_v4(),
    }
}

#[tokio::test]
async fn test_admin_lifts_moderator_suspension_early() {
    let harness = Harness::new();
    let moderator = harness.moderator();
    let administrator = harness.administrator();
    let member = harness.member();

    let suspension = harness
        .state
        .suspension_service
        .create_suspension(&moderator, suspension_request(&member, community(), SuspensionTerm::Days(7)))
        .await
        .expect("suspend");
    assert!(suspension.is_active);
    assert_eq!(suspension.duration_days, Some(7));
    assert_eq!(
        suspension.end_date,
        Some(suspension.start_date + Duration::days(7))
    );

    let lifted = harness
        .state
        .suspension_service
        .lift_early(&administrator, suspension.id, "appeal approved")
        .await
        .expect("lift");
    assert!(!lifted.is_active);
    assert!(lifted.lifted_early);
    assert_eq!(lifted.lifted_reason.as_deref(), Some("appeal approved"));
    assert!(lifted.lifted_at.is_some());

    assert_eq!(harness.audit.kinds(), vec!["suspension_created", "suspension_lifted"]);
}

#[tokio::test]
async fn test_second_lift_is_a_no_op() {
    let harness = Harness::new();
    let moderator = harness.moderator();
    let member = harness.member();

    let service = &harness.state.suspension_service;
    let suspension = service
        .create_suspension(&moderator, suspension_request(&member, community(), SuspensionTerm::Days(3)))
        .await
        .expect("suspend");

    let first = service.lift_early(&moderator, suspension.id, "misjudged").await.expect("lift");
    let second = service.lift_early(&moderator, suspension.id, "again").await.expect("repeat");
    assert_eq!(second.lifted_at, first.lifted_at);
    assert_eq!(second.lifted_reason.as_deref(), Some("misjudged"));
    assert_eq!(harness.audit.kinds().len(), 2);
}

#[tokio::test]
async fn test_moderator_duration_limits() {
    let harness = Harness::new();
    let moderator = harness.moderator();
    let administrator = harness.administrator();
    let member = harness.member();
    let service = &harness.state.suspension_service;

    let too_long = service
        .create_suspension(&moderator, suspension_request(&member, community(), SuspensionTerm::Days(31)))
        .await;
    assert!(matches!(too_long, Err(AppError::Forbidden(_))));

    let permanent = service
        .create_suspension(&moderator, suspension_request(&member, community(), SuspensionTerm::Permanent))
        .await;
    assert!(matches!(permanent, Err(AppError::Forbidden(_))));

    let zero = service
        .create_suspension(&moderator, suspension_request(&member, community(), SuspensionTerm::Days(0)))
        .await;
    assert!(matches!(zero, Err(AppError::Validation(_))));

    let ban = service
        .create_suspension(
            &administrator,
            suspension_request(&member, SuspensionScope::Platform, SuspensionTerm::Permanent),
        )
        .await
        .expect("permanent ban");
    assert!(ban.is_permanent);
    assert!(ban.end_date.is_none());
    assert!(ban.is_active);

    let member_attempt = service
        .create_suspension(&harness.member(), suspension_request(&member, community(), SuspensionTerm::Days(1)))
        .await;
    assert!(matches!(member_attempt, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_lift_scope_follows_issue_scope() {
    let mut config = test_config();
    config.suspension_policy.moderator_platform_allowed = false;
    let harness = Harness::with_config(config);
    let moderator = harness.moderator();
    let administrator = harness.administrator();
    let member = harness.member();
    let service = &harness.state.suspension_service;

    let suspension = service
        .create_suspension(
            &administrator,
            suspension_request(&member, SuspensionScope::Platform, SuspensionTerm::Days(14)),
        )
        .await
        .expect("suspend");

    let result = service.lift_early(&moderator, suspension.id, "leniency").await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let blank = service.lift_early(&administrator, suspension.id, "   ").await;
    assert!(matches!(blank, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_moderator_lifts_platform_suspension_they_may_issue() {
    let harness = Harness::new();
    let moderator = harness.moderator();
    let member = harness.member();
    let service = &harness.state.suspension_service;

    let suspension = service
        .create_suspension(
            &moderator,
            suspension_request(&member, SuspensionScope::Platform, SuspensionTerm::Days(5)),
        )
        .await
        .expect("suspend");

    let lifted = service.lift_early(&moderator, suspension.id, "wrong account").await.expect("lift");
    assert!(lifted.lifted_early);
}

#[tokio::test]
async fn test_term_beyond_the_calendar_is_rejected() {
    let harness = Harness::new();
    let administrator = harness.administrator();
    let member = harness.member();
    let service = &harness.state.suspension_service;

    let result = service
        .create_suspension(
            &administrator,
            suspension_request(&member, SuspensionScope::Platform, SuspensionTerm::Days(200_000_000)),
        )
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    // The store stays usable afterwards
    let ok = service
        .create_suspension(
            &administrator,
            suspension_request(&member, SuspensionScope::Platform, SuspensionTerm::Days(36_500)),
        )
        .await
        .expect("century");
    assert!(ok.is_active);
}

#[tokio::test]
async fn test_concurrent_lifts_change_state_once() {
    let harness = Harness::new();
    let moderator = harness.moderator();
    let member = harness.member();
    let service = harness.state.suspension_service.clone();

    let suspension = service
        .create_suspension(&moderator, suspension_request(&member, community(), SuspensionTerm::Days(9)))
        .await
        .expect("suspend");

    let handles = (0..8).map(|i| {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .lift_early(&moderator, suspension.id, &format!("lift {}", i))
                .await
        })
    });

    let views: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("join").expect("lift"))
        .collect();

    let first = &views[0];
    assert!(views.iter().all(|v| v.lifted_at == first.lifted_at));
    assert!(views.iter().all(|v| v.lifted_reason == first.lifted_reason));
    let lifted_events = harness
        .audit
        .kinds()
        .into_iter()
        .filter(|kind| *kind == "suspension_lifted")
        .count();
    assert_eq!(lifted_events, 1);
}

#[tokio::test]
async fn test_linked_action_must_be_a_sanction_for_the_same_member() {
    let harness = Harness::new();
    let moderator = harness.moderator();
    let member = harness.member();
    let other = harness.member();
    let service = &harness.state.suspension_service;

    let warning = harness.act(&moderator, &member, ActionType::IssueWarning, None).await;
    let mut request = suspension_request(&member, community(), SuspensionTerm::Days(2));
    request.moderation_action_id = Some(warning.action.id);
    assert!(matches!(
        service.create_suspension(&moderator, request).await,
        Err(AppError::Validation(_))
    ));

    let sanction = harness.act(&moderator, &member, ActionType::SuspendUser, None).await;
    let mut request = suspension_request(&other, community(), SuspensionTerm::Days(2));
    request.moderation_action_id = Some(sanction.action.id);
    assert!(matches!(
        service.create_suspension(&moderator, request).await,
        Err(AppError::Validation(_))
    ));

    let mut request = suspension_request(&member, community(), SuspensionTerm::Days(2));
    request.moderation_action_id = Some(sanction.action.id);
    let linked = service.create_suspension(&moderator, request).await.expect("linked");
    assert_eq!(linked.moderation_action_id, Some(sanction.action.id));
}

#[tokio::test]
async fn test_expiry_sweep_stamps_end_date() {
    let harness = Harness::new();
    let moderator = harness.moderator();
    let member = harness.member();
    let service = &harness.state.suspension_service;

    let suspension = service
        .create_suspension(&moderator, suspension_request(&member, community(), SuspensionTerm::Days(1)))
        .await
        .expect("suspend");

    assert!(service.expire_due(Utc::now()).await.is_empty());

    let expired = service.expire_due(Utc::now() + Duration::days(2)).await;
    assert_eq!(expired, vec![suspension.id]);

    let view = service.get_suspension(&moderator, suspension.id).await.expect("get");
    assert!(!view.is_active);
    assert!(!view.lifted_early);
    assert_eq!(view.expired_at, suspension.end_date);

    let lift = service.lift_early(&moderator, suspension.id, "too late").await;
    assert!(matches!(lift, Err(AppError::InvalidState(_))));
}

#[tokio::test]
async fn test_member_sees_own_suspensions_without_notes() {
    let harness = Harness::new();
    let moderator = harness.moderator();
    let member = harness.member();
    let stranger = harness.member();
    let service = &harness.state.suspension_service;

    let active = service
        .create_suspension(&moderator, suspension_request(&member, community(), SuspensionTerm::Days(5)))
        .await
        .expect("active");
    let lifted = service
        .create_suspension(&moderator, suspension_request(&member, community(), SuspensionTerm::Days(5)))
        .await
        .expect("lifted");
    service.lift_early(&moderator, lifted.id, "duplicate").await.expect("lift");

    let own = service
        .list_for_member(&member, member.user_id, SuspensionQuery { active: Some(true) })
        .await
        .expect("own");
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].id, active.id);
    assert!(own[0].internal_notes.is_none());

    let staff_view = service
        .list_for_member(&moderator, member.user_id, SuspensionQuery::default())
        .await
        .expect("staff");
    assert_eq!(staff_view.len(), 2);
    assert!(staff_view.iter().all(|s| s.internal_notes.is_some()));

    assert!(matches!(
        service.list_for_member(&stranger, member.user_id, SuspensionQuery::default()).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        service.get_suspension(&stranger, active.id).await,
        Err(AppError::Forbidden(_))
    ));
}
