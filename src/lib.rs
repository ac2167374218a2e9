// Export modules for library usage
pub mod analysis;
pub mod cli;
pub mod commands;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod errors;
pub mod io;
pub mod registry;
pub mod tokens;

// Re-export commonly used types
pub use crate::analysis::{
    ArgumentClassifier, CacheStats, Disposition, ExpectedSlashedCheck, KeyRules,
    NonceVerificationCheck, ScanCache, Scope, Verdict,
};
pub use crate::config::Config;
pub use crate::diagnostics::{Diagnostic, InlineSuppressions, Reporter, Severity};
pub use crate::engine::{Engine, FileReport};
pub use crate::errors::{Error, Result};
pub use crate::registry::{CallContract, Registry};
pub use crate::tokens::{SourceFile, Token, TokenKind};
