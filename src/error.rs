// src/error.rs

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::directory::Transport;

/// Одна неудачная попытка bind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindFailure {
    pub principal: String,
    pub transport: Transport,
    pub reason: String,
}

impl fmt::Display for BindFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} via {}: {}", self.principal, self.transport, self.reason)
    }
}

/// Ошибки подключения к каталогу
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("no password supplied for {0}")]
    MissingPassword(String),

    #[error("could not bind to {server}: {}", join_failures(.attempts))]
    Exhausted {
        server: String,
        attempts: Vec<BindFailure>,
    },
}

fn join_failures(attempts: &[BindFailure]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Ошибки выполнения поиска. Пустой результат ошибкой не считается.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search under {base} failed: {source}")]
    Transport {
        base: String,
        #[source]
        source: ldap3::LdapError,
    },

    #[error("search under {base} rejected with code {rc}: {text}")]
    Rejected { base: String, rc: u32, text: String },
}

/// Ошибка чтения отдельного атрибута. Наружу из поиска не выходит.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    #[error("attribute {0} is missing")]
    Missing(String),
    #[error("attribute {0} is empty")]
    Empty(String),
    #[error("attribute {0} holds binary data")]
    Binary(String),
}

/// Ошибки записи файлов подписи
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("invalid identity {0:?}")]
    InvalidIdentity(String),

    #[error("cannot create {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Не удалось сделать подпись подписью по умолчанию. Не фатально.
#[derive(Debug, Error)]
pub enum RegistrationWarning {
    #[error("default signature registration is only available on Windows")]
    Unsupported,

    #[error("cannot run reg.exe: {0}")]
    Spawn(#[from] io::Error),

    #[error("reg.exe exited with {status}: {stderr}")]
    Rejected { status: String, stderr: String },
}

/// Ошибки загрузки конфигурации
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration file found (tried {})", join_paths(.0))]
    NotFound(Vec<PathBuf>),

    #[error("config error: {0}")]
    Source(#[from] config::ConfigError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("{0} already exists, use --force to overwrite")]
    AlreadyExists(PathBuf),
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Ошибки верхнего уровня для CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{failed} of {total} signatures could not be written")]
    Incomplete { failed: usize, total: usize },
}
