// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use sitecost_core::CoreError;
use sitecost_domain::DomainError;
use sitecost_persistence::PersistenceError;

/// Errors that can occur while propagating staleness or running rebuilds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A persistence operation failed.
    Persistence(PersistenceError),
    /// A report build failed.
    Build(CoreError),
    /// A domain rule was violated (bad configuration, calendar overflow).
    DomainViolation(DomainError),
    /// A document failed to serialize.
    Serialization(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Persistence(err) => write!(f, "Persistence error: {err}"),
            Self::Build(err) => write!(f, "Build error: {err}"),
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::Serialization(msg) => write!(f, "Serialization error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<PersistenceError> for EngineError {
    fn from(err: PersistenceError) -> Self {
        Self::Persistence(err)
    }
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        Self::Build(err)
    }
}

impl From<DomainError> for EngineError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
