//! Issuer and gate over a shared key store and identity directory.

use std::sync::Arc;

use tessera::{
    Clock, FixedClock,
    auth::{CredentialIssuer, RequestGate},
    config::AuthConfig,
    constants::{ACCESS_TTL_SECS, DEFAULT_ADMIN_PASSWORD, REFRESH_TTL_SECS},
    keys::KeyRing,
    user::{InMemoryUserDirectory, Role},
};

use crate::helpers::{
    MEMBER_PASSWORD, NEW_PASSWORD, TestKeyStore, seeded_directory, test_key_ring,
};

const START_MS: u64 = 1_700_000_000_000;

struct Deployment {
    issuer: CredentialIssuer,
    gate: RequestGate,
    replica_gate: RequestGate,
    replica_issuer: CredentialIssuer,
    users: Arc<InMemoryUserDirectory>,
    clock: Arc<FixedClock>,
    _keys: TestKeyStore,
}

/// Two server instances sharing keys, identities and time.
async fn deployment() -> Deployment {
    let (ring, keys) = test_key_ring().await;
    let replica_ring = KeyRing::new(keys.store.clone());
    let (users, _, _) = seeded_directory().await;
    let clock = Arc::new(FixedClock::new(START_MS));
    let config = Arc::new(AuthConfig::default());

    Deployment {
        issuer: CredentialIssuer::new(users.clone(), ring.clone(), clock.clone(), config.clone()),
        gate: RequestGate::new(users.clone(), ring, clock.clone(), config.clone()),
        replica_gate: RequestGate::new(
            users.clone(),
            replica_ring.clone(),
            clock.clone(),
            config.clone(),
        ),
        replica_issuer: CredentialIssuer::new(users.clone(), replica_ring, clock.clone(), config),
        users,
        clock,
        _keys: keys,
    }
}

#[tokio::test]
async fn any_instance_accepts_any_instances_credentials() {
    let d = deployment().await;

    let grant = d.issuer.login("admin", DEFAULT_ADMIN_PASSWORD).await.unwrap();
    let identity = d
        .replica_gate
        .authenticate(Some(&grant.access.token))
        .await
        .unwrap();
    assert_eq!(identity, grant.identity);

    let renewed = d.replica_issuer.refresh(&grant.refresh.token).await.unwrap();
    assert_eq!(renewed.identity.id, grant.identity.id);
    d.gate
        .authenticate(Some(&renewed.access.token))
        .await
        .unwrap();
}

#[tokio::test]
async fn access_lifetime_ends_exactly_at_expiry() {
    let d = deployment().await;
    let grant = d.issuer.login("member", MEMBER_PASSWORD).await.unwrap();
    assert_eq!(grant.access.expires_at - d.clock.now_secs(), ACCESS_TTL_SECS);

    d.clock.advance_secs(ACCESS_TTL_SECS as u64 - 1);
    d.gate.authenticate(Some(&grant.access.token)).await.unwrap();

    d.clock.advance_secs(1);
    let err = d
        .gate
        .authenticate(Some(&grant.access.token))
        .await
        .unwrap_err();
    assert!(err.is_invalid_or_expired());

    // The refresh credential outlives it and mints a fresh one.
    let renewed = d.issuer.refresh(&grant.refresh.token).await.unwrap();
    d.gate
        .authenticate(Some(&renewed.access.token))
        .await
        .unwrap();
}

#[tokio::test]
async fn refresh_lifetime_ends_exactly_at_expiry() {
    let d = deployment().await;
    let grant = d.issuer.login("member", MEMBER_PASSWORD).await.unwrap();

    d.clock.advance_secs(REFRESH_TTL_SECS as u64 - 1);
    d.issuer.refresh(&grant.refresh.token).await.unwrap();

    d.clock.advance_secs(1);
    let err = d.issuer.refresh(&grant.refresh.token).await.unwrap_err();
    assert!(err.is_invalid_or_expired());
}

#[tokio::test]
async fn directory_changes_apply_to_live_sessions() {
    let d = deployment().await;
    let grant = d.issuer.login("member", MEMBER_PASSWORD).await.unwrap();
    let id = grant.identity.id;

    // Promotion is visible on the next request, not at the next login.
    assert!(d.users.set_role(id, Role::Admin).await);
    let identity = d
        .gate
        .authenticate(Some(&grant.access.token))
        .await
        .unwrap();
    assert!(identity.is_admin());

    assert!(d.users.set_locked(id, true).await);
    let err = d
        .gate
        .authenticate(Some(&grant.access.token))
        .await
        .unwrap_err();
    assert!(err.is_account_locked());
    let err = d.issuer.refresh(&grant.refresh.token).await.unwrap_err();
    assert!(err.is_invalid_or_expired());

    assert!(d.users.remove(id).await);
    let err = d
        .gate
        .authenticate(Some(&grant.access.token))
        .await
        .unwrap_err();
    assert!(err.is_invalid_or_expired());
}

#[tokio::test]
async fn password_change_keeps_existing_sessions() {
    let d = deployment().await;
    let grant = d.issuer.login("member", MEMBER_PASSWORD).await.unwrap();

    d.issuer
        .change_password(grant.identity.id, MEMBER_PASSWORD, NEW_PASSWORD, NEW_PASSWORD)
        .await
        .unwrap();

    d.gate.authenticate(Some(&grant.access.token)).await.unwrap();
    assert!(
        d.issuer
            .login("member", MEMBER_PASSWORD)
            .await
            .unwrap_err()
            .is_unauthorized()
    );
    d.issuer.login("member", NEW_PASSWORD).await.unwrap();
}
