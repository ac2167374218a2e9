//! The two token-stream checks and the machinery they share.
//!
//! - [`nonce`]: request superglobals must follow a nonce verification call in
//!   their scope ([`scope`] finds the scope, [`nonce_cache`] memoizes the scans)
//! - [`slashing`]: arguments of registered functions must honour their slashing
//!   contracts ([`call_site`] finds the calls, [`classifier`] judges arguments)

pub mod call_site;
pub mod classifier;
pub mod nonce;
pub mod nonce_cache;
pub mod scope;
pub mod slashing;

pub use call_site::{match_call, split_arguments, ArgumentSpan, CallRegistry, CallSite};
pub use classifier::{ArgumentClassifier, Disposition, KeyRules, Reason, Verdict, Violation};
pub use nonce::{
    is_assignment, is_in_isset_or_empty, NonceVerificationCheck, NONCE_CHECK, NONCE_SUPPRESSION,
};
pub use nonce_cache::{CacheStats, ScanCache, ScopeScanState};
pub use scope::{resolve_scope, Scope};
pub use slashing::{ExpectedSlashedCheck, SLASHING_CHECK, SLASHING_SUPPRESSION};
