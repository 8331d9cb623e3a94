//! Client sessions against a live server: renewal, coalescing and teardown.

use std::time::Duration;

use reqwest::StatusCode;
use tessera::{
    client::{ApiRequest, ClientError, RenewalError, SessionState, SessionStore},
    constants::{ACCESS_COOKIE, DEFAULT_ADMIN_PASSWORD, ME_PATH, REFRESH_COOKIE},
    user::{Identity, Role},
};

use crate::helpers::{MEMBER_PASSWORD, TestServer};

const CONCURRENT_CALLERS: usize = 8;

async fn signed_in(server: &TestServer, username: &str, password: &str) -> SessionStore {
    let session = SessionStore::connect(&server.url).unwrap();
    session.login(username, password).await.unwrap();
    session
}

/// Fire `CONCURRENT_CALLERS` identity requests at once.
async fn concurrent_me(session: &SessionStore) -> Vec<Result<Identity, ClientError>> {
    let mut tasks = Vec::new();
    for _ in 0..CONCURRENT_CALLERS {
        let api = session.api().clone();
        tasks.push(tokio::spawn(async move {
            api.get_json::<Identity>(ME_PATH).await
        }));
    }

    let mut results = Vec::new();
    for task in tasks {
        results.push(task.await.unwrap());
    }
    results
}

#[tokio::test]
async fn login_populates_session_state() {
    let server = TestServer::start().await;
    let session = SessionStore::connect(&server.url).unwrap();
    let mut updates = session.subscribe();
    assert_eq!(session.state(), SessionState::Anonymous);

    let identity = session
        .login("admin", DEFAULT_ADMIN_PASSWORD)
        .await
        .unwrap();
    assert_eq!(identity.id, 1);
    assert_eq!(identity.role, Role::Admin);
    assert!(session.is_authenticated());
    assert!(session.is_admin());
    assert!(session.api().has_cookie(ACCESS_COOKIE));
    assert!(session.api().has_cookie(REFRESH_COOKIE));

    assert!(updates.has_changed().unwrap());
    assert_eq!(
        *updates.borrow_and_update(),
        SessionState::Authenticated(identity.clone())
    );

    let me = session.api().get_json::<Identity>(ME_PATH).await.unwrap();
    assert_eq!(me, identity);
}

#[tokio::test]
async fn bad_login_leaves_session_anonymous() {
    let server = TestServer::start().await;
    let session = SessionStore::connect(&server.url).unwrap();

    let err = session.login("admin", "nope").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(!err.is_session_expired());
    assert_eq!(session.state(), SessionState::Anonymous);
    assert_eq!(session.api().coordinator().refresh_count(), 0);
    assert_eq!(server.hits.refresh(), 0);
}

#[tokio::test]
async fn logout_drops_cookies_and_identity() {
    let server = TestServer::start().await;
    let session = signed_in(&server, "member", MEMBER_PASSWORD).await;

    session.logout().await;
    assert_eq!(session.state(), SessionState::Anonymous);
    assert!(!session.api().has_cookie(ACCESS_COOKIE));
    assert!(!session.api().has_cookie(REFRESH_COOKIE));

    let response = session.api().send(&ApiRequest::get(ME_PATH)).await;
    assert!(matches!(
        response,
        Err(ClientError::SessionExpired {
            source: RenewalError::Rejected { status: 401 }
        })
    ));
}

#[tokio::test]
async fn fetch_identity_uses_the_session_cookies() {
    let server = TestServer::start().await;
    let session = signed_in(&server, "member", MEMBER_PASSWORD).await;
    assert_eq!(
        session.fetch_identity().await.map(|i| i.username),
        Some("member".to_string())
    );

    // Signed-out clients get no identity and no error.
    let stranger = SessionStore::connect(&server.url).unwrap();
    assert_eq!(stranger.fetch_identity().await, None);
    assert!(!stranger.is_authenticated());
    assert_eq!(stranger.identity(), None);
}

#[tokio::test]
async fn expired_access_is_renewed_transparently() {
    let server = TestServer::start().await;
    let session = signed_in(&server, "member", MEMBER_PASSWORD).await;
    server.expire_access();

    let me = session.api().get_json::<Identity>(ME_PATH).await.unwrap();
    assert_eq!(me.username, "member");
    assert_eq!(server.hits.refresh(), 1);
    assert_eq!(session.api().coordinator().refresh_count(), 1);

    // The renewed credential is good for subsequent calls.
    session.api().get_json::<Identity>(ME_PATH).await.unwrap();
    assert_eq!(server.hits.refresh(), 1);
    assert!(session.is_authenticated());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_expiry_triggers_one_refresh() {
    let server = TestServer::start().await;
    let session = signed_in(&server, "member", MEMBER_PASSWORD).await;
    server.hits.delay_refresh(Duration::from_millis(200));
    server.expire_access();

    let results = concurrent_me(&session).await;
    for result in results {
        assert_eq!(result.unwrap().id, server.member.id);
    }
    assert_eq!(server.hits.refresh(), 1);
    assert_eq!(session.api().coordinator().refresh_count(), 1);
    assert_eq!(session.api().coordinator().teardown_count(), 0);
    assert!(!session.api().coordinator().is_renewing());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failed_renewal_tears_down_once() {
    let server = TestServer::start().await;
    let session = signed_in(&server, "member", MEMBER_PASSWORD).await;
    let mut updates = session.subscribe();
    updates.borrow_and_update();

    server.hits.delay_refresh(Duration::from_millis(200));
    server.expire_refresh();

    let results = concurrent_me(&session).await;
    for result in results {
        let err = result.unwrap_err();
        assert!(err.is_session_expired(), "{err}");
        assert!(err.is_unauthorized());
    }

    assert_eq!(server.hits.refresh(), 1);
    assert_eq!(session.api().coordinator().teardown_count(), 1);
    assert_eq!(server.hits.logout(), 1);
    assert_eq!(session.state(), SessionState::Expired);
    assert!(updates.has_changed().unwrap());
    assert!(!session.api().has_cookie(ACCESS_COOKIE));

    // The slot is free again: a new login followed by expiry renews normally.
    session.login("member", MEMBER_PASSWORD).await.unwrap();
    server.expire_access();
    session.api().get_json::<Identity>(ME_PATH).await.unwrap();
    assert_eq!(server.hits.refresh(), 2);
}

#[tokio::test]
async fn locked_account_ends_the_session() {
    let server = TestServer::start().await;
    let session = signed_in(&server, "member", MEMBER_PASSWORD).await;
    server.users.set_locked(server.member.id, true).await;

    let response = session.api().send(&ApiRequest::get(ME_PATH)).await;
    match response {
        Err(ClientError::SessionExpired { source }) => {
            assert_eq!(source, RenewalError::Rejected { status: 401 })
        }
        other => panic!("expected an expired session, got {other:?}"),
    }
    assert_eq!(session.state(), SessionState::Expired);
    assert_eq!(session.api().coordinator().teardown_count(), 1);
}

#[tokio::test]
async fn non_auth_failures_pass_through() {
    let server = TestServer::start().await;
    let session = signed_in(&server, "member", MEMBER_PASSWORD).await;

    let response = session
        .api()
        .send(&ApiRequest::get("/no/such/route"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let err = session
        .api()
        .get_json::<Identity>("/admin/whoami")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(403));
    assert_eq!(server.hits.refresh(), 0);
    assert!(session.is_authenticated());
}
