use std::time::Duration;

use notebox::api::{create_router, create_router_with_security};
use notebox::client::poller::NotePoller;
use notebox::client::{ClientError, NotesClient};
use notebox::config::SecurityConfig;
use notebox::db::Database;
use notebox::models::*;
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

fn test_db() -> Database {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    db
}

/// Serve `app` on an ephemeral port and return the API base URL.
async fn spawn(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });
    format!("http://{}/api/v1", addr)
}

/// A base URL nothing is listening on.
async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");
    drop(listener);
    format!("http://{}/api/v1", addr)
}

mod notes_client {
    use super::*;

    #[tokio::test]
    async fn round_trips_the_note_lifecycle() {
        let client = NotesClient::new(spawn(create_router(test_db())).await, None);

        let created = assert_ok!(client.create_note(&NoteInput::new("Groceries", "")).await);
        assert_eq!(created.created_at, created.updated_at);

        let updated = assert_ok!(
            client
                .update_note(created.id, &NoteInput::new("Groceries", "milk, eggs"))
                .await
        );
        assert!(updated.updated_at > updated.created_at);
        assert_eq!(assert_ok!(client.get_note(created.id).await), updated);
        assert_eq!(assert_ok!(client.list_notes().await), vec![updated]);

        let confirmation = assert_ok!(client.delete_note(created.id).await);
        assert_eq!(confirmation.id, created.id);

        let err = assert_err!(client.get_note(created.id).await);
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[tokio::test]
    async fn maps_validation_errors_to_bad_request() {
        let client = NotesClient::new(spawn(create_router(test_db())).await, None);

        let err = assert_err!(client.create_note(&NoteInput::default()).await);
        match err {
            ClientError::BadRequest(message) => assert_eq!(message, "title is required"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn maps_unknown_ids_to_not_found() {
        let client = NotesClient::new(spawn(create_router(test_db())).await, None);

        let err = assert_err!(client.delete_note(Uuid::new_v4()).await);
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[tokio::test]
    async fn sends_the_api_key() {
        let app = create_router_with_security(test_db(), SecurityConfig::with_api_key("secret"));
        let base = spawn(app).await;

        let anonymous = NotesClient::new(base.clone(), None);
        let err = assert_err!(anonymous.list_notes().await);
        assert!(matches!(err, ClientError::Unauthorized));

        let authorized = NotesClient::new(base, Some("secret".to_string()));
        assert_ok!(authorized.list_notes().await);
    }

    #[tokio::test]
    async fn reports_health() {
        let db = test_db();
        db.create_note(NoteInput::new("One", ""))
            .expect("Failed to create note");
        let client = NotesClient::new(spawn(create_router(db)).await, None);

        let health = assert_ok!(client.health().await);
        assert!(health.is_ok());
        assert_eq!(health.notes, Some(1));
    }

    #[tokio::test]
    async fn surfaces_connection_failures() {
        let client = NotesClient::new(dead_url().await, None);

        let err = assert_err!(client.health().await);
        assert!(matches!(err, ClientError::Http(_)));
    }
}

mod poller {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(50);
    const WAIT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn publishes_immediately_and_picks_up_changes() {
        let db = test_db();
        let client = NotesClient::new(spawn(create_router(db.clone())).await, None);
        let mut handle = NotePoller::start(client, INTERVAL);

        let first = tokio::time::timeout(WAIT, handle.next())
            .await
            .expect("No snapshot published")
            .expect("Poller ended early");
        assert_eq!(first.generation, 1);
        assert!(first.notes.is_empty());
        assert!(first.error.is_none());

        let note = db
            .create_note(NoteInput::new("Appears later", ""))
            .expect("Failed to create note");

        let seen = tokio::time::timeout(WAIT, async {
            loop {
                let snapshot = handle.next().await.expect("Poller ended early");
                if !snapshot.notes.is_empty() {
                    return snapshot;
                }
            }
        })
        .await
        .expect("Change never observed");
        assert_eq!(seen.notes, vec![note]);
        assert_eq!(handle.latest(), seen);
        assert!(handle.is_running());

        handle.stop().await;
    }

    #[tokio::test]
    async fn stop_ends_the_task_and_closes_subscribers() {
        let client = NotesClient::new(spawn(create_router(test_db())).await, None);
        let handle = NotePoller::start(client, INTERVAL);
        let mut subscriber = handle.subscribe();

        handle.stop().await;

        // Drain whatever was published before the stop, then the channel closes.
        let closed = tokio::time::timeout(WAIT, async {
            while subscriber.changed().await.is_ok() {}
        })
        .await;
        assert!(closed.is_ok());
    }

    #[tokio::test]
    async fn dropping_the_handle_stops_polling() {
        let client = NotesClient::new(spawn(create_router(test_db())).await, None);
        let handle = NotePoller::start(client, INTERVAL);
        let mut subscriber = handle.subscribe();

        drop(handle);

        let closed = tokio::time::timeout(WAIT, async {
            while subscriber.changed().await.is_ok() {}
        })
        .await;
        assert!(closed.is_ok());
    }

    #[tokio::test]
    async fn records_errors_when_the_server_is_unreachable() {
        let client = NotesClient::new(dead_url().await, None);
        let mut handle = NotePoller::start(client, INTERVAL);

        let snapshot = tokio::time::timeout(WAIT, handle.next())
            .await
            .expect("No snapshot published")
            .expect("Poller ended early");
        assert!(snapshot.error.is_some());
        assert!(snapshot.fetched_at.is_none());
        assert!(snapshot.notes.is_empty());

        handle.stop().await;
    }

    #[tokio::test]
    async fn zero_interval_is_raised_to_the_minimum() {
        let client = NotesClient::new(spawn(create_router(test_db())).await, None);
        let mut handle = NotePoller::start(client, Duration::ZERO);

        for generation in 1..=2 {
            let snapshot = tokio::time::timeout(WAIT, handle.next())
                .await
                .expect("No snapshot published")
                .expect("Poller ended early");
            assert!(snapshot.generation >= generation);
            assert!(snapshot.error.is_none());
        }
        assert!(handle.is_running());

        handle.stop().await;
    }
}
