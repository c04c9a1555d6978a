mod common;

use tokio::sync::broadcast::error::TryRecvError;

use common::{Call, Harness, person, prize};
use lottery_console::{
    error::ConsoleError,
    services::{prize_service, session_service},
    state::{NoticeLevel, prize::AllocationBucket, prize::PrizeEdit},
};

async fn ready(prizes: Vec<serde_json::Value>) -> Harness {
    let harness = Harness::seeded("token-1", 41, vec![person("A1", false)], prizes);
    session_service::bootstrap(&harness.state, Some("key-1"))
        .await
        .unwrap();
    harness.api.clear_calls();
    harness
}

fn rename(name: &str) -> PrizeEdit {
    PrizeEdit {
        name: Some(name.to_string()),
        ..PrizeEdit::default()
    }
}

#[tokio::test]
async fn save_one_sends_joined_limits_and_reconciles() {
    let harness = ready(vec![prize(1, "Laptop", 13, 13, "13")]).await;

    let edited = {
        let mut board = harness.state.prizes_mut().await;
        board.select_prize(1).unwrap();
        board
            .commit_selected(vec![
                AllocationBucket::new("0", 3),
                AllocationBucket::new("1", 10),
            ])
            .unwrap()
            .clone()
    };

    prize_service::save_one(&harness.state, &edited)
        .await
        .unwrap();

    assert_eq!(
        harness.api.calls(),
        vec![
            Call::UpdatePrize {
                id: 1,
                limit: "3,10".into()
            },
            Call::ListPrizes(41),
        ]
    );
    let board = harness.state.prizes().await;
    let draws: Vec<u32> = board
        .get(1)
        .unwrap()
        .allocation
        .buckets
        .iter()
        .map(|bucket| bucket.draw_count)
        .collect();
    assert_eq!(draws, vec![3, 10]);
    assert!(board.selected().is_none());
}

#[tokio::test]
async fn save_one_without_buckets_sends_default_limit() {
    let harness = ready(vec![prize(1, "Laptop", 2, 2, "2")]).await;
    let cleared = {
        let mut board = harness.state.prizes_mut().await;
        board.toggle_exhausted(1).unwrap().clone()
    };
    assert!(cleared.allocation.buckets.is_empty());

    prize_service::save_one(&harness.state, &cleared)
        .await
        .unwrap();

    assert_eq!(
        harness.api.calls()[0],
        Call::UpdatePrize {
            id: 1,
            limit: "1".into()
        }
    );
}

#[tokio::test]
async fn save_one_rejected_by_remote_skips_reconciliation() {
    let harness = ready(vec![prize(1, "Laptop", 3, 3, "3")]).await;
    let edited = {
        let mut board = harness.state.prizes_mut().await;
        board.edit_prize(1, rename("Gaming laptop")).unwrap().clone()
    };
    harness.api.fail_update(1);
    let mut notices = harness.state.notices().subscribe();

    let err = prize_service::save_one(&harness.state, &edited)
        .await
        .unwrap_err();

    let ConsoleError::Sync(message) = err else {
        panic!("expected a sync error");
    };
    assert!(message.contains("update refused"), "{message}");
    assert_eq!(
        harness.api.calls(),
        vec![Call::UpdatePrize {
            id: 1,
            limit: "3".into()
        }]
    );
    assert_eq!(notices.try_recv().unwrap().level, NoticeLevel::Error);
    assert_eq!(harness.api.remote_prize_names(), vec!["Laptop".to_string()]);
}

#[tokio::test]
async fn save_all_reports_failure_and_still_reconciles() {
    let harness = ready(vec![
        prize(1, "Laptop", 3, 3, "3"),
        prize(2, "Mug", 5, 5, "5"),
    ])
    .await;
    {
        let mut board = harness.state.prizes_mut().await;
        board.edit_prize(1, rename("Gaming laptop")).unwrap();
        board.edit_prize(2, rename("Golden mug")).unwrap();
    }
    harness.api.fail_update(2);
    let mut notices = harness.state.notices().subscribe();

    let err = prize_service::save_all(&harness.state).await.unwrap_err();

    let ConsoleError::Sync(message) = err else {
        panic!("expected a sync error");
    };
    assert!(message.contains("update refused"), "{message}");

    let calls = harness.api.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[..2].contains(&Call::UpdatePrize {
        id: 1,
        limit: "3".into()
    }));
    assert!(calls[..2].contains(&Call::UpdatePrize {
        id: 2,
        limit: "5".into()
    }));
    assert_eq!(calls[2], Call::ListPrizes(41));

    // The cache mirrors what the remote actually holds after the batch.
    let board = harness.state.prizes().await;
    assert_eq!(board.get(1).unwrap().name, "Gaming laptop");
    assert_eq!(board.get(2).unwrap().name, "Mug");

    assert_eq!(notices.try_recv().unwrap().level, NoticeLevel::Error);
}

#[tokio::test]
async fn delete_all_is_sequential_with_one_summary_notice() {
    let harness = ready(vec![
        prize(1, "Laptop", 1, 1, "1"),
        prize(2, "Mug", 1, 1, "1"),
        prize(3, "Pen", 1, 1, "1"),
    ])
    .await;
    harness.api.fail_delete(2);
    let mut notices = harness.state.notices().subscribe();

    let summary = prize_service::delete_all(&harness.state).await.unwrap();

    assert_eq!(summary.deleted, vec![1, 3]);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, 2);
    assert_eq!(
        harness.api.calls(),
        vec![
            Call::DeletePrize(1),
            Call::DeletePrize(2),
            Call::DeletePrize(3),
            Call::ListPrizes(41),
        ]
    );
    assert_eq!(harness.state.prizes().await.ids(), vec![2]);

    let notice = notices.try_recv().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(matches!(notices.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn add_mark_and_delete_round_trip_through_the_remote() {
    let harness = ready(vec![prize(1, "Laptop", 1, 1, "1")]).await;

    prize_service::add_prize(&harness.state).await.unwrap();
    assert_eq!(harness.state.prizes().await.len(), 2);
    assert_eq!(
        harness.api.remote_prize_names(),
        vec!["Laptop".to_string(), "New prize".to_string()]
    );

    prize_service::mark_prize_ended(&harness.state, 1)
        .await
        .unwrap();
    assert!(harness.state.prizes().await.get(1).unwrap().exhausted);

    prize_service::set_prize_for_all(&harness.state, 1, true)
        .await
        .unwrap();
    assert!(harness.state.prizes().await.get(1).unwrap().eligible_for_all);

    prize_service::delete_prize(&harness.state, 1).await.unwrap();
    assert!(harness.state.prizes().await.get(1).is_none());
}

#[tokio::test]
async fn writes_need_an_established_scope() {
    let harness = Harness::new();
    let mut notices = harness.state.notices().subscribe();

    assert!(matches!(
        prize_service::save_all(&harness.state).await,
        Err(ConsoleError::MissingScope)
    ));
    assert!(matches!(
        prize_service::add_prize(&harness.state).await,
        Err(ConsoleError::MissingScope)
    ));
    assert!(matches!(
        prize_service::delete_all(&harness.state).await,
        Err(ConsoleError::MissingScope)
    ));
    assert!(harness.api.calls().is_empty());
    assert_eq!(notices.try_recv().unwrap().level, NoticeLevel::Error);
}
