use crate::file::FsyncPolicy;

#[derive(Debug, Clone)]
pub enum AuditBackendConfig {
    File { path: String, fsync: FsyncPolicy },
    Sql { path: String },
}

/// Audit middleware configuration (spec.md §4.6). `strict` escalates a
/// backend write failure from a logged warning into a request-failing
/// error.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub enabled: bool,
    pub log_arguments: bool,
    pub log_results: bool,
    pub strict: bool,
    pub backend: AuditBackendConfig,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_arguments: false,
            log_results: false,
            strict: false,
            backend: AuditBackendConfig::File { path: "audit.ndjson".to_string(), fsync: FsyncPolicy::default() },
        }
    }
}
