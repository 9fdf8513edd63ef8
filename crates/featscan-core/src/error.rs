//! 配置级错误（调用方必须感知的失败）
//!
//! 单文件读取失败、目录条目格式错误都不会走到这里：它们只记日志并跳过。
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("scan root does not exist or is not a directory: {0}")]
    MissingRoot(PathBuf),

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {origin}")]
    Toml {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid {kind} symbol pattern `{pattern}`")]
    Pattern {
        kind: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to build test-marker automaton")]
    Markers(#[from] aho_corasick::BuildError),

    #[error("failed to build thread pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, AuditError>;
