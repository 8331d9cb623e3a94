use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    extract::Request,
    middleware::{self, Next},
};
use tessera::{
    FixedClock,
    config::AuthConfig,
    constants::{DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME, LOGOUT_PATH, REFRESH_PATH},
    keys::{InMemoryKeyStore, KeyRing, KeyStore, ensure_keys},
    server::{AppState, router},
    user::{Identity, InMemoryUserDirectory, Role},
};

/// Password given to the non-admin account on every test server.
pub const MEMBER_PASSWORD: &str = "hunter22";

/// A new password strong enough to pass the strength check.
pub const NEW_PASSWORD: &str = "tidal-Q7vz-2Lr9wK";

/// A key store plus whatever must outlive it (a temporary directory for SQLite).
pub struct TestKeyStore {
    pub store: Arc<dyn KeyStore>,
    _dir: Option<tempfile::TempDir>,
}

/// Creates a test key store based on TEST_KEYSTORE env var.
///
/// Supported values:
/// - "inmemory" or unset: InMemoryKeyStore (default)
/// - "sqlite": SQLite file in a temporary directory (requires `sqlite` feature)
/// - "postgres": PostgreSQL (requires `postgres` feature and TEST_POSTGRES_URL)
///
/// ```bash
/// TEST_KEYSTORE=sqlite cargo test --features sqlite
/// ```
pub async fn test_key_store() -> TestKeyStore {
    match std::env::var("TEST_KEYSTORE").as_deref() {
        Ok("sqlite") => {
            #[cfg(feature = "sqlite")]
            {
                use tessera::keys::SqlKeyStore;
                let dir = tempfile::tempdir().expect("Failed to create temp dir");
                let store = SqlKeyStore::open_sqlite(dir.path().join("keys.db"))
                    .await
                    .expect("Failed to create SQLite key store");
                TestKeyStore {
                    store: Arc::new(store),
                    _dir: Some(dir),
                }
            }
            #[cfg(not(feature = "sqlite"))]
            {
                panic!("TEST_KEYSTORE=sqlite requires the 'sqlite' feature to be enabled")
            }
        }
        Ok("postgres") => {
            #[cfg(feature = "postgres")]
            {
                use tessera::keys::SqlKeyStore;
                let url = std::env::var("TEST_POSTGRES_URL")
                    .unwrap_or_else(|_| "postgres://localhost/tessera_test".to_string());
                let store = SqlKeyStore::connect_postgres(&url)
                    .await
                    .expect("Failed to connect to PostgreSQL");
                TestKeyStore {
                    store: Arc::new(store),
                    _dir: None,
                }
            }
            #[cfg(not(feature = "postgres"))]
            {
                panic!("TEST_KEYSTORE=postgres requires the 'postgres' feature to be enabled")
            }
        }
        Ok("inmemory") | Ok("") | Err(_) => TestKeyStore {
            store: Arc::new(InMemoryKeyStore::new()),
            _dir: None,
        },
        Ok(other) => {
            panic!("Unknown TEST_KEYSTORE value: {other}. Supported: inmemory, sqlite, postgres")
        }
    }
}

/// Creates a key ring over a fresh, initialized test key store.
pub async fn test_key_ring() -> (KeyRing, TestKeyStore) {
    let keys = test_key_store().await;
    ensure_keys(keys.store.as_ref())
        .await
        .expect("Failed to initialize keys");
    (KeyRing::new(keys.store.clone()), keys)
}

/// A directory holding `admin` (id 1, password `123456`) and `member` (id 2).
pub async fn seeded_directory() -> (Arc<InMemoryUserDirectory>, Identity, Identity) {
    let users = Arc::new(InMemoryUserDirectory::new());
    let admin = users
        .insert(DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD, Role::Admin)
        .await
        .expect("Failed to create admin");
    let member = users
        .insert("member", MEMBER_PASSWORD, Role::User)
        .await
        .expect("Failed to create member");
    (users, admin, member)
}

/// Per-path request counters, plus an optional delay applied to refresh calls.
#[derive(Debug, Default)]
pub struct Hits {
    refresh: AtomicUsize,
    logout: AtomicUsize,
    refresh_delay_ms: AtomicU64,
}

impl Hits {
    pub fn refresh(&self) -> usize {
        self.refresh.load(Ordering::SeqCst)
    }

    pub fn logout(&self) -> usize {
        self.logout.load(Ordering::SeqCst)
    }

    /// Hold every refresh response back, widening the window in which
    /// concurrent requests can pile up behind it.
    pub fn delay_refresh(&self, delay: Duration) {
        self.refresh_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

async fn count_hits(hits: Arc<Hits>, request: Request, next: Next) -> axum::response::Response {
    match request.uri().path() {
        REFRESH_PATH => {
            hits.refresh.fetch_add(1, Ordering::SeqCst);
            let delay = hits.refresh_delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }
        LOGOUT_PATH => {
            hits.logout.fetch_add(1, Ordering::SeqCst);
        }
        _ => {}
    }
    next.run(request).await
}

/// A live server on an ephemeral port with a controllable clock.
pub struct TestServer {
    pub url: String,
    pub clock: Arc<FixedClock>,
    pub users: Arc<InMemoryUserDirectory>,
    pub admin: Identity,
    pub member: Identity,
    pub hits: Arc<Hits>,
    _keys: TestKeyStore,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(AuthConfig::default()).await
    }

    pub async fn start_with(config: AuthConfig) -> Self {
        let (ring, keys) = test_key_ring().await;
        let (users, admin, member) = seeded_directory().await;
        // Cookie expiry is judged by the HTTP client in real time.
        let clock = Arc::new(FixedClock::starting_now());
        let hits = Arc::new(Hits::default());

        let state = AppState::new(users.clone(), ring, clock.clone(), config);
        let counter = hits.clone();
        let app = router(state).layer(middleware::from_fn(move |request: Request, next: Next| {
            count_hits(counter.clone(), request, next)
        }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server failed");
        });

        Self {
            url: format!("http://{addr}"),
            clock,
            users,
            admin,
            member,
            hits,
            _keys: keys,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.url)
    }

    /// Move server time past the access lifetime but inside the refresh lifetime.
    pub fn expire_access(&self) {
        self.clock.advance_secs(tessera::constants::ACCESS_TTL_SECS as u64 + 60);
    }

    /// Move server time past the refresh lifetime.
    pub fn expire_refresh(&self) {
        self.clock
            .advance_secs(tessera::constants::REFRESH_TTL_SECS as u64 + 60);
    }
}

/// Collect the `Set-Cookie` headers of a response.
pub fn set_cookies(response: &reqwest::Response) -> Vec<String> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}

/// The `name=value` pair of the `Set-Cookie` header for `name`, if any.
pub fn cookie_pair(set_cookies: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    set_cookies
        .iter()
        .find(|c| c.starts_with(&prefix))
        .and_then(|c| c.split(';').next().map(str::to_string))
}
