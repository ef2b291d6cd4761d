mod common;

use futures::future::join_all;
use uuid::Uuid;

use boardkeeper_common::{AppError, Principal};
use boardkeeper_moderation::models::{ContentRef, PenaltyRequest, RecordVoteRequest, VoteType};

use common::Harness;

fn vote(target: ContentRef, vote_type: VoteType) -> RecordVoteRequest {
    RecordVoteRequest { target, vote_type }
}

/// A member who has earned enough to downvote.
async fn trusted_voter(harness: &Harness) -> Principal {
    let voter = harness.member();
    harness.upvote_topics(&voter, 10).await;
    voter
}

#[tokio::test]
async fn test_single_topic_downvote() {
    let harness = Harness::new();
    let author = harness.member();
    let voter = trusted_voter(&harness).await;
    let topic = harness.topic_by(&author);

    let outcome = harness
        .state
        .reputation_service
        .record_vote(&voter, vote(topic, VoteType::Downvote))
        .await
        .expect("downvote");

    assert_eq!(outcome.vote.owner_id, author.user_id);
    assert_eq!(outcome.owner_reputation.topics_score, -2);
    assert_eq!(outcome.owner_reputation.total_score, -2);
    assert_eq!(outcome.owner_reputation.downvotes_received, 1);
}

#[tokio::test]
async fn test_ten_upvotes_then_a_downvote() {
    let harness = Harness::new();
    let author = harness.member();
    let topic = harness.topic_by(&author);
    let service = &harness.state.reputation_service;

    for _ in 0..10 {
        service
            .record_vote(&harness.member(), vote(topic, VoteType::Upvote))
            .await
            .expect("upvote");
    }
    let voter = trusted_voter(&harness).await;
    let outcome = service
        .record_vote(&voter, vote(topic, VoteType::Downvote))
        .await
        .expect("downvote");

    assert_eq!(outcome.owner_reputation.topics_score, 48);
    assert_eq!(outcome.owner_reputation.upvotes_received, 10);
    assert_eq!(outcome.owner_reputation.downvotes_received, 1);
}

#[tokio::test]
async fn test_reply_weights_and_vote_change() {
    let harness = Harness::new();
    let author = harness.member();
    let voter = trusted_voter(&harness).await;
    let reply = harness.reply_by(&author);
    let service = &harness.state.reputation_service;

    let up = service
        .record_vote(&voter, vote(reply, VoteType::Upvote))
        .await
        .expect("upvote");
    assert_eq!(up.owner_reputation.replies_score, 2);

    let changed = service
        .record_vote(&voter, vote(reply, VoteType::Downvote))
        .await
        .expect("change");
    assert_eq!(changed.owner_reputation.replies_score, -1);
    assert_eq!(changed.owner_reputation.upvotes_received, 0);
    assert_eq!(changed.owner_reputation.downvotes_received, 1);
    assert_eq!(changed.vote.created_at, up.vote.created_at);

    let repeated = service
        .record_vote(&voter, vote(reply, VoteType::Downvote))
        .await
        .expect("repeat");
    assert_eq!(repeated.owner_reputation.replies_score, -1);
}

#[tokio::test]
async fn test_vote_gates() {
    let harness = Harness::new();
    let author = harness.member();
    let newcomer = harness.member();
    let topic = harness.topic_by(&author);
    let service = &harness.state.reputation_service;

    let self_vote = service.record_vote(&author, vote(topic, VoteType::Upvote)).await;
    assert!(matches!(self_vote, Err(AppError::Forbidden(_))));

    let downvote = service.record_vote(&newcomer, vote(topic, VoteType::Downvote)).await;
    assert!(matches!(downvote, Err(AppError::Forbidden(_))));

    // Upvotes carry no threshold
    assert!(service.record_vote(&newcomer, vote(topic, VoteType::Upvote)).await.is_ok());

    let missing = service
        .record_vote(&newcomer, vote(ContentRef::Topic(Uuid::new_v4()), VoteType::Upvote))
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_penalties_do_not_unlock_or_block_downvotes() {
    let harness = Harness::new();
    let administrator = harness.administrator();
    let voter = trusted_voter(&harness).await;
    let service = &harness.state.reputation_service;

    let record = service
        .apply_penalty(
            &administrator,
            voter.user_id,
            PenaltyRequest {
                delta: -40,
                reason: "Vote manipulation ring".to_string(),
                moderation_action_id: None,
            },
        )
        .await
        .expect("penalty");
    assert_eq!(record.total_score, 50);
    assert_eq!(record.effective_score, 10);

    let topic = harness.topic_by(&harness.member());
    assert!(service.record_vote(&voter, vote(topic, VoteType::Downvote)).await.is_ok());

    let moderator_attempt = service
        .apply_penalty(
            &harness.moderator(),
            voter.user_id,
            PenaltyRequest {
                delta: -5,
                reason: "Not allowed".to_string(),
                moderation_action_id: None,
            },
        )
        .await;
    assert!(matches!(moderator_attempt, Err(AppError::Forbidden(_))));

    let zero = service
        .record_moderation_penalty(voter.user_id, 0, "noop".to_string(), None)
        .await;
    assert!(matches!(zero, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_adjustments_that_would_overflow_are_rejected() {
    let harness = Harness::new();
    let administrator = harness.administrator();
    let member = harness.member();
    let service = &harness.state.reputation_service;

    let oversized = service
        .apply_penalty(
            &administrator,
            member.user_id,
            PenaltyRequest {
                delta: 5_000_000,
                reason: "Out of range".to_string(),
                moderation_action_id: None,
            },
        )
        .await;
    assert!(matches!(oversized, Err(AppError::Validation(_))));

    service
        .record_moderation_penalty(member.user_id, i64::MAX, "ceiling".to_string(), None)
        .await
        .expect("ceiling");
    let past_ceiling = service
        .record_moderation_penalty(member.user_id, 1, "one more".to_string(), None)
        .await;
    assert!(matches!(past_ceiling, Err(AppError::Validation(_))));

    let record = service.get_reputation(member.user_id).await;
    assert_eq!(record.moderation_adjustment, i64::MAX);
    assert_eq!(service.penalties(member.user_id).await.len(), 1);
}

#[tokio::test]
async fn test_recompute_matches_incremental_record() {
    let harness = Harness::new();
    let author = harness.member();
    let voter = trusted_voter(&harness).await;
    let service = &harness.state.reputation_service;

    harness.upvote_topics(&author, 3).await;
    let reply = harness.reply_by(&author);
    service
        .record_vote(&voter, vote(reply, VoteType::Upvote))
        .await
        .expect("upvote");
    service
        .record_vote(&voter, vote(reply, VoteType::Downvote))
        .await
        .expect("change");
    service
        .record_moderation_penalty(author.user_id, -7, "Warning".to_string(), None)
        .await
        .expect("penalty");

    let incremental = service.get_reputation(author.user_id).await;
    let first = service.recompute(author.user_id).await;
    let second = service.recompute(author.user_id).await;

    for record in [&first, &second] {
        assert_eq!(record.topics_score, incremental.topics_score);
        assert_eq!(record.replies_score, incremental.replies_score);
        assert_eq!(record.total_score, 14);
        assert_eq!(record.moderation_adjustment, -7);
        assert_eq!(record.effective_score, 7);
    }
}

#[tokio::test]
async fn test_concurrent_votes_are_not_lost() {
    let harness = Harness::new();
    let author = harness.member();
    let topic = harness.topic_by(&author);
    let voters: Vec<Principal> = (0..25).map(|_| harness.member()).collect();

    let service = harness.state.reputation_service.clone();
    let handles = voters.into_iter().map(|voter| {
        let service = service.clone();
        tokio::spawn(async move { service.record_vote(&voter, vote(topic, VoteType::Upvote)).await })
    });

    for result in join_all(handles).await {
        result.expect("join").expect("vote");
    }

    let record = service.get_reputation(author.user_id).await;
    assert_eq!(record.topics_score, 125);
    assert_eq!(record.upvotes_received, 25);
    assert_eq!(service.recompute(author.user_id).await.total_score, 125);
}
