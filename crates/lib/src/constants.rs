//! Names and lifetimes shared by the server and the client.

/// Cookie carrying the access credential.
pub const ACCESS_COOKIE: &str = "auth-token";

/// Cookie carrying the refresh credential.
pub const REFRESH_COOKIE: &str = "auth-refresh-token";

/// One day.
pub const ACCESS_TTL_SECS: i64 = 24 * 60 * 60;

/// Seven days.
pub const REFRESH_TTL_SECS: i64 = 7 * 24 * 60 * 60;

pub const LOGIN_PATH: &str = "/auth/login";
pub const REFRESH_PATH: &str = "/auth/refresh";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const ME_PATH: &str = "/auth/me";
pub const CHANGE_PASSWORD_PATH: &str = "/auth/change-password";
pub const INIT_ADMIN_PATH: &str = "/dev/init-admin";
pub const HEALTH_PATH: &str = "/health";

/// Routes that bypass the request gate by default.
pub const DEFAULT_PUBLIC_ROUTES: &[&str] = &[
    LOGIN_PATH,
    REFRESH_PATH,
    LOGOUT_PATH,
    INIT_ADMIN_PATH,
    HEALTH_PATH,
];

/// Key store entry: symmetric key for access credentials.
pub const LOCAL_KEY: &str = "localKey";

/// Key store entry: Ed25519 seed for signing refresh credentials.
pub const REFRESH_PRIVATE_KEY: &str = "refreshPrivateKey";

/// Key store entry: Ed25519 verifying key for refresh credentials.
pub const REFRESH_PUBLIC_KEY: &str = "refreshPublicKey";

/// Minimum accepted length for a new password.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Minimum zxcvbn score (0-4) accepted for a new password.
pub const MIN_PASSWORD_SCORE: u8 = 3;

/// Path of the admin-only identity echo route.
pub const ADMIN_WHOAMI_PATH: &str = "/admin/whoami";

/// Username of the bootstrap admin account.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Password of the bootstrap admin account when none is configured.
pub const DEFAULT_ADMIN_PASSWORD: &str = "123456";
