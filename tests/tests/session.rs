use lectern_api::{Error as ApiError, PasswordChange, ProfileUpdate, Registration};
use lectern_client::{Backend, Error, FileStore, MemoryStore, Session, SessionStore};
use tests::{Fixture, PASSWORD, STUDENT};

fn registration(username: &str, password2: &str) -> Registration {
    Registration {
        username: String::from(username),
        email: format!("{username}@example.org"),
        password: String::from(PASSWORD),
        password2: String::from(password2),
    }
}

#[tokio::test]
async fn login_then_hydrate_in_new_session() {
    let f = Fixture::new();
    let mut session = Session::new(f.anonymous(), MemoryStore::new());
    assert!(!session.is_authenticated());
    let user = session.login(STUDENT, PASSWORD).await.unwrap();
    assert_eq!(user.id, f.student);
    let stored = session.store().get().unwrap();
    assert_eq!(stored.user.username, STUDENT);

    let mut restored = Session::new(f.anonymous(), MemoryStore::with(stored));
    let user = restored.hydrate().await.unwrap();
    assert_eq!(user.id, f.student);
    assert!(restored.is_authenticated());
    assert!(restored.backend().tokens().is_some());
}

#[tokio::test]
async fn hydrate_without_saved_session() {
    let f = Fixture::new();
    let mut session = Session::new(f.anonymous(), MemoryStore::new());
    assert!(session.hydrate().await.is_none());
    assert_eq!(f.server.calls("profile"), 0);
}

#[tokio::test]
async fn hydrate_with_revoked_tokens_logs_out() {
    let f = Fixture::new();
    let mut session = Session::new(f.anonymous(), MemoryStore::new());
    session.login(STUDENT, PASSWORD).await.unwrap();
    let stored = session.store().get().unwrap();
    f.server.revoke_sessions(f.student);

    let mut restored = Session::new(f.anonymous(), MemoryStore::with(stored));
    assert!(restored.hydrate().await.is_none());
    assert!(!restored.is_authenticated());
    assert_eq!(restored.store().get(), None);
    assert_eq!(restored.backend().tokens(), None);
}

#[tokio::test]
async fn hydrate_keeps_stored_user_when_profile_is_unavailable() {
    let f = Fixture::new();
    let mut session = Session::new(f.anonymous(), MemoryStore::new());
    session.login(STUDENT, PASSWORD).await.unwrap();
    let stored = session.store().get().unwrap();

    f.server
        .fail_next("profile", ApiError::Unknown(String::from("maintenance")));
    let mut restored = Session::new(f.anonymous(), MemoryStore::with(stored.clone()));
    assert_eq!(restored.hydrate().await, Some(&stored.user));
    assert_eq!(restored.store().get(), Some(stored));
}

#[tokio::test]
async fn hydrate_from_file() {
    let f = Fixture::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let mut session = Session::new(f.anonymous(), FileStore::new(&path));
    session.login(STUDENT, PASSWORD).await.unwrap();
    assert!(path.exists());

    let mut restored = Session::new(f.anonymous(), FileStore::new(&path));
    assert_eq!(restored.hydrate().await.map(|u| u.id), Some(f.student));

    restored.logout();
    assert!(!path.exists());
    assert_eq!(FileStore::new(&path).load().unwrap(), None);
}

#[tokio::test]
async fn unreadable_file_is_cleared() {
    let f = Fixture::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "garbage").unwrap();

    let mut session = Session::new(f.anonymous(), FileStore::new(&path));
    assert!(session.hydrate().await.is_none());
    assert!(!path.exists());
}

#[tokio::test]
async fn failed_login_stays_logged_out() {
    let f = Fixture::new();
    let mut session = Session::new(f.anonymous(), MemoryStore::new());
    let err = session.login(STUDENT, "wrong password").await.unwrap_err();
    assert!(err.is_unauthorized(), "unexpected error {err:?}");
    assert!(!session.is_authenticated());
    assert_eq!(session.store().get(), None);
    assert_eq!(session.backend().tokens(), None);
}

#[tokio::test]
async fn logout_forgets_everything() {
    let f = Fixture::new();
    let mut session = Session::new(f.anonymous(), MemoryStore::new());
    session.login(STUDENT, PASSWORD).await.unwrap();
    session.logout();
    assert!(!session.is_authenticated());
    assert_eq!(session.user(), None);
    assert_eq!(session.store().get(), None);
    assert_eq!(session.backend().tokens(), None);
}

#[tokio::test]
async fn register_logs_in() {
    let f = Fixture::new();
    let mut session = Session::new(f.anonymous(), MemoryStore::new());
    let user = session
        .register(&registration("newcomer", PASSWORD))
        .await
        .unwrap();
    assert_eq!(user.username, "newcomer");
    assert!(session.is_authenticated());
    assert!(session.store().get().is_some());
}

#[tokio::test]
async fn invalid_registration_never_reaches_server() {
    let f = Fixture::new();
    let mut session = Session::new(f.anonymous(), MemoryStore::new());
    let err = session
        .register(&registration("newcomer", "something else"))
        .await
        .unwrap_err();
    match err {
        Error::Invalid(errs) => assert!(errs.get("password2").is_some()),
        e => panic!("unexpected error {e:?}"),
    }
    assert_eq!(f.server.total_calls(), 0);
}

#[tokio::test]
async fn duplicate_registration_is_reported() {
    let f = Fixture::new();
    let mut session = Session::new(f.anonymous(), MemoryStore::new());
    let err = session
        .register(&registration(STUDENT, PASSWORD))
        .await
        .unwrap_err();
    match err.api() {
        Some(ApiError::Validation(fields)) => assert!(fields.contains_key("username")),
        _ => panic!("unexpected error {err:?}"),
    }
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn profile_update_is_saved() {
    let f = Fixture::new();
    let mut session = Session::new(f.anonymous(), MemoryStore::new());
    session.login(STUDENT, PASSWORD).await.unwrap();
    let user = session
        .update_profile(&ProfileUpdate {
            bio: Some(String::from("Learning Rust")),
            ..ProfileUpdate::default()
        })
        .await
        .unwrap();
    assert_eq!(user.bio, "Learning Rust");
    assert_eq!(session.store().get().unwrap().user.bio, "Learning Rust");
}

#[tokio::test]
async fn change_password() {
    let f = Fixture::new();
    let mut session = Session::new(f.anonymous(), MemoryStore::new());
    session.login(STUDENT, PASSWORD).await.unwrap();

    let calls = f.server.total_calls();
    let err = session
        .change_password(&PasswordChange {
            old_password: String::from(PASSWORD),
            new_password: String::from("short"),
            new_password2: String::from("short"),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Invalid(_)));
    assert_eq!(f.server.total_calls(), calls);

    session
        .change_password(&PasswordChange {
            old_password: String::from(PASSWORD),
            new_password: String::from("a much better password"),
            new_password2: String::from("a much better password"),
        })
        .await
        .unwrap();
    session.logout();
    session
        .login(STUDENT, "a much better password")
        .await
        .unwrap();
}
