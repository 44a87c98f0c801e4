//! Tamper-evident, hash-chained audit logging with file and SQL backends
//! (spec.md C8).

mod backend;
mod chain;
mod config;
mod file;
mod middleware;
mod record;
mod sql;

pub use backend::AuditBackend;
pub use chain::{recover_chain, AuditChain};
pub use config::{AuditBackendConfig, AuditConfig};
pub use file::{FileAuditBackend, FsyncPolicy};
pub use middleware::AuditMiddleware;
pub use record::AuditRecord;
pub use sql::SqlAuditBackend;
