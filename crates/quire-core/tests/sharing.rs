use std::time::Duration;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use quire_core::events::{self, EventReceiver};
use quire_core::models::TodoItem;
use quire_core::{
    EngineEvent, Error, Identity, MemoryRemote, MemoryStore, Note, Session, SharedNotice,
    SyncEngine, TodoList, TodoRecord,
};

type Engine = SyncEngine<MemoryStore, MemoryRemote>;

fn note(content: &str, updated_at: i64) -> Note {
    let mut note = Note::new_at("My Notes", updated_at);
    note.content = content.to_string();
    note
}

async fn session_for(
    identity: Identity,
    notes: Vec<Note>,
    remote: MemoryRemote,
) -> (Engine, Session, EventReceiver) {
    let (sender, receiver) = events::channel();
    let engine = SyncEngine::new(MemoryStore::durable(notes, false), remote, sender);
    let session = engine
        .start_session(identity, Duration::from_millis(1000))
        .await
        .unwrap();
    (engine, session, receiver)
}

async fn remote_with_profiles() -> MemoryRemote {
    let remote = MemoryRemote::new();
    remote.add_profile("alice", "Alice", 1).await;
    remote.add_profile("bob", "Bob", 2).await;
    remote.add_profile("carol", "Carol", 3).await;
    remote
}

#[tokio::test]
async fn owner_sees_one_entry_with_recipients() {
    let x = note("plans", 100);
    let remote = remote_with_profiles().await;
    remote.seed_note("alice", x.clone()).await;
    remote.seed_share(x.id, "alice", "bob").await;
    // A stray self-share must not produce a second entry
    remote.seed_share(x.id, "alice", "alice").await;

    let (engine, mut session, mut events) =
        session_for(Identity::new("alice", "Alice"), vec![x.clone()], remote).await;
    engine.aggregate_shared(&mut session).await.unwrap();

    let entries = session.shared_notes();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].is_own);
    assert_eq!(entries[0].note.id, x.id);
    assert!(entries[0].shared_with_names.contains(&"Bob".to_string()));
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn recipient_sees_owner_and_is_notified_once() {
    let x = note("plans", 100);
    let remote = remote_with_profiles().await;
    remote.seed_note("alice", x.clone()).await;
    remote.seed_share(x.id, "alice", "bob").await;

    let (engine, mut session, mut events) =
        session_for(Identity::new("bob", "Bob"), Vec::new(), remote).await;
    engine.aggregate_shared(&mut session).await.unwrap();

    let entries = session.shared_notes();
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].is_own);
    assert_eq!(entries[0].owner_display_name, "Alice");
    assert_eq!(entries[0].owner_avatar_num, 1);
    assert_eq!(
        events.try_recv().unwrap(),
        EngineEvent::NewSharedNotes(SharedNotice::Single {
            owner_name: "Alice".to_string()
        })
    );

    engine.aggregate_shared(&mut session).await.unwrap();
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn two_new_shares_are_counted_then_quiet() {
    let a = note("a", 100);
    let b = note("b", 200);
    let gone = note("deleted", 300).soft_deleted(300);
    let remote = remote_with_profiles().await;
    remote.seed_note("alice", a.clone()).await;
    remote.seed_note("carol", b.clone()).await;
    remote.seed_note("carol", gone.clone()).await;
    remote.seed_share(a.id, "alice", "bob").await;
    remote.seed_share(b.id, "carol", "bob").await;
    remote.seed_share(gone.id, "carol", "bob").await;

    let (engine, mut session, mut events) =
        session_for(Identity::new("bob", "Bob"), Vec::new(), remote).await;
    engine.aggregate_shared(&mut session).await.unwrap();

    let ids: Vec<_> = session.shared_notes().iter().map(|e| e.note.id).collect();
    assert_eq!(ids, vec![b.id, a.id]);
    assert_eq!(
        events.try_recv().unwrap(),
        EngineEvent::NewSharedNotes(SharedNotice::Many { count: 2 })
    );

    engine.aggregate_shared(&mut session).await.unwrap();
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn failed_query_keeps_previous_entries() {
    let x = note("plans", 100);
    let remote = remote_with_profiles().await;
    remote.seed_note("alice", x.clone()).await;
    remote.seed_share(x.id, "alice", "bob").await;

    let (engine, mut session, _events) =
        session_for(Identity::new("bob", "Bob"), Vec::new(), remote).await;
    engine.aggregate_shared(&mut session).await.unwrap();
    assert_eq!(session.shared_notes().len(), 1);

    engine.remote().set_reads_fail(true).await;
    engine.aggregate_shared(&mut session).await.unwrap();
    assert_eq!(session.shared_notes().len(), 1);
}

#[tokio::test]
async fn share_and_unshare_refresh_the_list() {
    let x = note("plans", 100);
    let remote = remote_with_profiles().await;
    remote.seed_note("alice", x.clone()).await;

    let (engine, mut session, _events) =
        session_for(Identity::new("alice", "Alice"), vec![x.clone()], remote).await;

    engine.share_note(&mut session, &x.id, "carol").await.unwrap();
    assert_eq!(session.shared_notes().len(), 1);
    assert_eq!(
        session.shared_notes()[0].shared_with_names,
        vec!["Carol".to_string()]
    );

    engine.unshare_note(&mut session, &x.id, "carol").await.unwrap();
    assert!(session.shared_notes().is_empty());

    assert!(matches!(
        engine.share_note(&mut session, &x.id, "alice").await,
        Err(Error::InvalidInput(_))
    ));
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 4, d).unwrap()
}

#[tokio::test]
async fn todo_list_loads_rolls_over_once_and_pushes() {
    let remote = MemoryRemote::new();
    let (engine, mut session, _events) =
        session_for(Identity::new("alice", "Alice"), Vec::new(), remote).await;

    let list = TodoList {
        items: vec![
            TodoItem {
                id: "1".to_string(),
                text: "finished".to_string(),
                done: true,
                day: day(1),
            },
            TodoItem {
                id: "2".to_string(),
                text: "carried".to_string(),
                done: false,
                day: day(1),
            },
        ],
        rolled_over_on: Some(day(1)),
    };
    assert!(engine.save_todos(&mut session, list).await.unwrap());
    assert_eq!(session.todo().version_num, 1);

    assert!(engine.roll_over_todos(&mut session, day(2)).await.unwrap());
    assert!(!engine.roll_over_todos(&mut session, day(2)).await.unwrap());

    let pushed = engine.remote().todo("alice").await.unwrap();
    assert_eq!(pushed.version_num, 2);
    assert_eq!(pushed.list.items.len(), 1);
    assert_eq!(pushed.list.items[0].day, day(2));

    // A fresh session picks the pushed list up
    let mut other = Session::new(Identity::new("alice", "Alice"), Vec::new());
    let loaded: TodoRecord = engine.load_todos(&mut other).await.unwrap().clone();
    assert_eq!(loaded, pushed);
}

#[tokio::test]
async fn todo_push_failure_keeps_local_list() {
    let remote = MemoryRemote::new();
    remote.set_writes_fail(true).await;
    let (engine, mut session, _events) =
        session_for(Identity::new("alice", "Alice"), Vec::new(), remote).await;

    let list = TodoList::default();
    assert!(!engine.save_todos(&mut session, list).await.unwrap());
    assert_eq!(session.todo().version_num, 1);
}
