//! Domain types for the sign-in completion flow

pub mod callback;
pub mod identity;
pub mod outcome;
pub mod session;
pub mod user;

pub use callback::{sanitize_destination, CallbackLocation, IntendedDestination, NavigateOptions};
pub use identity::{Identity, IdentityHints};
pub use outcome::{AuthFailure, IndicatorKind, ResolverOutcome, ResolverState, StatusIndicator};
pub use session::{Session, SessionEvent};
pub use user::{NewUserProfile, UserProfile, UserRole};
