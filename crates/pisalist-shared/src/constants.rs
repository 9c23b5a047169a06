/// API path prefix used by the HTTP boundary
pub const API_PREFIX: &str = "/api/v1";

/// Maximum length of a task or wish `event` in characters
pub const MAX_EVENT_CHARS: usize = 256;

/// Inclusive bounds for `importance_level`
pub const MIN_IMPORTANCE: u8 = 0;
pub const MAX_IMPORTANCE: u8 = 5;

/// Username length bounds in characters
pub const MIN_USERNAME_CHARS: usize = 3;
pub const MAX_USERNAME_CHARS: usize = 32;

/// Minimum password length in characters
pub const MIN_PASSWORD_CHARS: usize = 6;

/// Maximum email length in characters
pub const MAX_EMAIL_CHARS: usize = 255;

/// Token lifetime when none is configured
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Number of calendar days covered by the timeline view, today included
pub const TIMELINE_DAYS: i64 = 7;

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Key derivation context (BLAKE3) for the token signing key
pub const KDF_CONTEXT_TOKEN_KEY: &str = "pisalist-token-signing-key-v1";
