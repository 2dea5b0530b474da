//! Application constants
//!
//! Centralized location for the domain-level constants used by the sign-in
//! flow.

// Routes
pub const DEFAULT_DESTINATION: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const CALLBACK_PATH: &str = "/auth/callback";

// Callback query parameters
pub const ERROR_PARAM: &str = "error";
pub const ERROR_DESCRIPTION_PARAM: &str = "error_description";
pub const CODE_PARAM: &str = "code";

// Resolver
pub const DEFAULT_SESSION_TIMEOUT_MS: u64 = 10_000;

// Profiles
pub const FALLBACK_DISPLAY_NAME: &str = "User";
pub const PROFILES_TABLE: &str = "users";

// Backend placeholders used outside production
pub const PLACEHOLDER_BACKEND_URL: &str = "https://placeholder.supabase.co";
pub const PLACEHOLDER_ANON_KEY: &str = "placeholder-key";

// OAuth redirect targets
pub const DEV_REDIRECT_URL: &str = "http://localhost:5173/auth/callback";
pub const PROD_REDIRECT_URL: &str = "https://magicboxai.in/auth/callback";
pub const PRODUCTION_DOMAIN: &str = "magicboxai.in";
