use std::sync::Arc;

use agora_core::{FixedClock, Forum, ForumError};
use agora_db::Database;
use agora_types::models::ReactionCounts;
use agora_types::reactions::{ReactionAction, ReactionState, TargetKind};
use chrono::{Duration, TimeZone, Utc};

fn forum() -> (Forum, Arc<Database>, Arc<FixedClock>) {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 9, 1, 12, 0, 0).unwrap()));
    (Forum::new(db.clone(), clock.clone()), db, clock)
}

#[test]
fn register_post_and_react() {
    let (forum, _, _) = forum();

    let (alice, alice_session) = forum.credentials.register("a@x.com", "alice", "secret1").unwrap();
    assert_eq!(forum.sessions.resolve(&alice_session.token).unwrap(), Some(alice.clone()));

    let post = forum.authoring.create_post(&alice, "Hello", "First post", &[1]).unwrap();

    forum.credentials.register("b@x.com", "bob", "secret2").unwrap();
    let (bob, bob_session) = forum.credentials.authenticate("b@x.com", "secret2").unwrap();
    let resolved = forum.sessions.resolve(&bob_session.token).unwrap();
    assert_eq!(resolved.as_ref(), Some(&bob));

    let state = forum.reactions.toggle(TargetKind::Post, post, bob.user_id, ReactionAction::Like).unwrap();
    assert_eq!(state, ReactionState::Liked);
    assert_eq!(
        forum.reactions.count(TargetKind::Post, post).unwrap(),
        ReactionCounts { likes: 1, dislikes: 0 }
    );

    let listed = forum.query.list_posts("", &[], Some(bob.user_id)).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].author_username, "alice");
    assert_eq!(listed[0].likes, 1);

    let state = forum.reactions.toggle(TargetKind::Post, post, bob.user_id, ReactionAction::Like).unwrap();
    assert_eq!(state, ReactionState::None);
    assert_eq!(forum.reactions.count(TargetKind::Post, post).unwrap(), ReactionCounts::default());
    assert!(forum.query.list_posts("", &[], Some(bob.user_id)).unwrap().is_empty());
}

#[test]
fn second_login_kills_the_first_session() {
    let (forum, db, _) = forum();
    let (alice, _) = forum.credentials.register("a@x.com", "alice", "secret1").unwrap();

    let (_, first) = forum.credentials.authenticate("a@x.com", "secret1").unwrap();
    let (_, second) = forum.credentials.authenticate("a@x.com", "secret1").unwrap();

    assert_eq!(db.count_sessions_for_user(alice.user_id).unwrap(), 1);
    assert!(forum.sessions.resolve(&first.token).unwrap().is_none());
    assert!(forum.sessions.resolve(&second.token).unwrap().is_some());
}

#[test]
fn sessions_lapse_after_a_day() {
    let (forum, _, clock) = forum();
    let (_, session) = forum.credentials.register("a@x.com", "alice", "secret1").unwrap();

    clock.advance(Duration::hours(23));
    assert!(forum.sessions.resolve(&session.token).unwrap().is_some());

    clock.advance(Duration::hours(2));
    assert!(forum.sessions.resolve(&session.token).unwrap().is_none());
    assert_eq!(forum.sessions.purge_expired().unwrap(), 1);
}

#[test]
fn concurrent_toggles_never_duplicate_rows() {
    let (forum, db, _) = forum();
    let (alice, _) = forum.credentials.register("a@x.com", "alice", "secret1").unwrap();
    let post = forum.authoring.create_post(&alice, "Hello", "World", &[1]).unwrap();

    // An even number of likes from one user must land back on None.
    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                forum
                    .reactions
                    .toggle(TargetKind::Post, post, alice.user_id, ReactionAction::Like)
                    .unwrap();
            });
        }
    });

    assert_eq!(
        forum.reactions.state(TargetKind::Post, post, alice.user_id).unwrap(),
        ReactionState::None
    );
    let rows: i64 = db
        .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM post_reactions", [], |r| r.get(0))?))
        .unwrap();
    assert_eq!(rows, 0);
}

#[test]
fn concurrent_reactions_from_many_users_all_count() {
    let (forum, _, _) = forum();
    let (alice, _) = forum.credentials.register("a@x.com", "alice", "secret1").unwrap();
    let post = forum.authoring.create_post(&alice, "Hello", "World", &[1]).unwrap();

    let mut voters = Vec::new();
    for i in 0..6 {
        let (identity, _) = forum
            .credentials
            .register(&format!("u{i}@x.com"), &format!("user_{i}"), "secret1")
            .unwrap();
        voters.push(identity);
    }

    std::thread::scope(|s| {
        for (i, voter) in voters.iter().enumerate() {
            let forum = &forum;
            s.spawn(move || {
                let action = if i % 2 == 0 { ReactionAction::Like } else { ReactionAction::Dislike };
                forum.reactions.toggle(TargetKind::Post, post, voter.user_id, action).unwrap();
            });
        }
    });

    assert_eq!(
        forum.reactions.count(TargetKind::Post, post).unwrap(),
        ReactionCounts { likes: 3, dislikes: 3 }
    );
}

#[test]
fn conflicting_registration_is_reported_as_conflict() {
    let (forum, _, _) = forum();
    forum.credentials.register("a@x.com", "alice", "secret1").unwrap();
    let err = forum.credentials.register("a@x.com", "alice", "secret1").unwrap_err();
    assert!(matches!(err, ForumError::Conflict(_)));
}

#[test]
fn full_board_listing_hydrates_every_post() {
    let (forum, _, clock) = forum();
    let (alice, _) = forum.credentials.register("a@x.com", "alice", "secret1").unwrap();
    let (bob, _) = forum.credentials.register("b@x.com", "bob", "secret2").unwrap();

    let mut ids = Vec::new();
    for i in 0..1201 {
        clock.advance(Duration::seconds(1));
        ids.push(forum.authoring.create_post(&alice, &format!("Post {i}"), "body", &[1, 4]).unwrap());
    }
    let oldest = ids[0];
    forum.reactions.toggle(TargetKind::Post, oldest, bob.user_id, ReactionAction::Like).unwrap();

    let listed = forum.query.list_posts("", &[], None).unwrap();
    assert_eq!(listed.len(), ids.len());
    assert!(listed.iter().all(|p| p.categories.len() == 2));

    let last = listed.last().unwrap();
    assert_eq!(last.id, oldest);
    assert_eq!((last.likes, last.dislikes), (1, 0));
}

#[test]
fn racing_registrations_for_one_email_yield_one_account() {
    let (forum, db, _) = forum();

    let outcomes: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..6)
            .map(|i| {
                let creds = forum.credentials.clone();
                s.spawn(move || creds.register("same@x.com", &format!("user_{i}"), "secret1"))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
    for outcome in outcomes.iter().filter_map(|o| o.as_ref().err()) {
        assert!(matches!(outcome, ForumError::Conflict(_)), "unexpected error: {outcome:?}");
    }
    assert!(db.email_taken("same@x.com").unwrap());
}
