//! Credentials crossing server instances that share a key store.

use tessera::{
    keys::KeyRing,
    token::{
        ACCESS_HEADER, AccessClaims, REFRESH_HEADER, RefreshClaims, decode_access,
        decode_refresh, encode_access, encode_refresh,
    },
    user::{Identity, Role},
};

use crate::helpers::test_key_ring;

const NOW: i64 = 1_700_000_000;

fn identity() -> Identity {
    Identity {
        id: 7,
        username: "carol".to_string(),
        role: Role::User,
        avatar: None,
        is_locked: false,
    }
}

#[tokio::test]
async fn replica_reads_credentials_minted_elsewhere() {
    let (minting, keys) = test_key_ring().await;
    let replica = KeyRing::new(keys.store.clone());

    let access = encode_access(
        &AccessClaims::for_identity(&identity(), NOW, NOW + 60),
        &minting.local_key().await.unwrap(),
    )
    .unwrap();
    assert!(access.starts_with(ACCESS_HEADER));
    let claims = decode_access(&access, &replica.local_key().await.unwrap(), NOW).unwrap();
    assert_eq!(claims.id, 7);
    assert_eq!(claims.username, "carol");
    assert_eq!(claims.role, Role::User);

    let refresh = encode_refresh(
        &RefreshClaims::for_subject(7, NOW, NOW + 60),
        &minting.refresh_signing_key().await.unwrap(),
    )
    .unwrap();
    assert!(refresh.starts_with(REFRESH_HEADER));
    let claims =
        decode_refresh(&refresh, &replica.refresh_verifying_key().await.unwrap(), NOW).unwrap();
    assert_eq!(claims.subject_id(), Some(7));
}

#[tokio::test]
async fn credentials_from_another_deployment_are_rejected() {
    let (ours, _ours_keys) = test_key_ring().await;
    let (theirs, _their_keys) = test_key_ring().await;

    let access = encode_access(
        &AccessClaims::for_identity(&identity(), NOW, NOW + 60),
        &theirs.local_key().await.unwrap(),
    )
    .unwrap();
    let err = decode_access(&access, &ours.local_key().await.unwrap(), NOW).unwrap_err();
    assert!(err.is_invalid_or_expired());
    assert!(!err.is_expired());

    let refresh = encode_refresh(
        &RefreshClaims::for_subject(7, NOW, NOW + 60),
        &theirs.refresh_signing_key().await.unwrap(),
    )
    .unwrap();
    let err =
        decode_refresh(&refresh, &ours.refresh_verifying_key().await.unwrap(), NOW).unwrap_err();
    assert!(err.is_invalid_or_expired());
}

#[tokio::test]
async fn access_and_refresh_credentials_are_not_interchangeable() {
    let (ring, _keys) = test_key_ring().await;

    let refresh = encode_refresh(
        &RefreshClaims::for_subject(7, NOW, NOW + 60),
        &ring.refresh_signing_key().await.unwrap(),
    )
    .unwrap();
    assert!(decode_access(&refresh, &ring.local_key().await.unwrap(), NOW).is_err());

    let access = encode_access(
        &AccessClaims::for_identity(&identity(), NOW, NOW + 60),
        &ring.local_key().await.unwrap(),
    )
    .unwrap();
    assert!(decode_refresh(&access, &ring.refresh_verifying_key().await.unwrap(), NOW).is_err());
}
