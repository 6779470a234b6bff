// src/directory/mod.rs

//! Подключение к Active Directory.
//!
//! Сеть спрятана за двумя трейтами: [`DirectoryConnector`] открывает
//! соединение и делает bind, [`DirectorySession`] выполняет поиск.
//! Порядок перебора форматов логина живёт в [`DirectoryClient`].

pub mod ldap;
pub mod search;

use std::fmt;

use ldap3::SearchEntry;
use tracing::{debug, info, warn};

use crate::error::{BindFailure, ConnectionError, SearchError};

pub use ldap::{LdapConnector, LdapSession};
pub use search::{USER_ATTRIBUTES, UserSearch, alternate_base, user_filter};

/// Параметры одной сессии
#[derive(Clone)]
pub struct ConnectionConfig {
    pub server: String,
    pub domain: String,
    pub base_dn: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("server", &self.server)
            .field("domain", &self.domain)
            .field("base_dn", &self.base_dn)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Транспорт: обычный LDAP (389) или LDAPS (636)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Plain,
    Secure,
}

impl Transport {
    pub fn port(self) -> u16 {
        match self {
            Transport::Plain => 389,
            Transport::Secure => 636,
        }
    }

    pub fn scheme(self) -> &'static str {
        match self {
            Transport::Plain => "ldap",
            Transport::Secure => "ldaps",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scheme(), self.port())
    }
}

/// Адрес сервера вместе с транспортом
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub transport: Transport,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, transport: Transport) -> Self {
        Self {
            host: host.into(),
            transport,
        }
    }

    pub fn url(&self) -> String {
        format!(
            "{}://{}:{}",
            self.transport.scheme(),
            self.host,
            self.transport.port()
        )
    }
}

/// Формат имени для bind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindFormat {
    /// DOMAIN\username
    DownLevel,
    /// username@server
    AtServer,
    /// username@DOMAIN
    AtDomain,
    /// username
    Bare,
}

impl BindFormat {
    pub fn principal(self, config: &ConnectionConfig) -> String {
        match self {
            BindFormat::DownLevel => format!("{}\\{}", config.domain, config.username),
            BindFormat::AtServer => format!("{}@{}", config.username, config.server),
            BindFormat::AtDomain => format!("{}@{}", config.username, config.domain),
            BindFormat::Bare => config.username.clone(),
        }
    }
}

/// Одна попытка подключения: формат логина + транспорт
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindAttempt {
    pub format: BindFormat,
    pub transport: Transport,
}

/// Порядок попыток: четыре формата по 389, затем LDAPS с DOMAIN\username
pub const BIND_PLAN: [BindAttempt; 5] = [
    BindAttempt {
        format: BindFormat::DownLevel,
        transport: Transport::Plain,
    },
    BindAttempt {
        format: BindFormat::AtServer,
        transport: Transport::Plain,
    },
    BindAttempt {
        format: BindFormat::AtDomain,
        transport: Transport::Plain,
    },
    BindAttempt {
        format: BindFormat::Bare,
        transport: Transport::Plain,
    },
    BindAttempt {
        format: BindFormat::DownLevel,
        transport: Transport::Secure,
    },
];

/// Открывает соединение и выполняет simple bind
#[allow(async_fn_in_trait)]
pub trait DirectoryConnector {
    type Session: DirectorySession;

    /// Ошибка возвращается текстом: она попадает в сводку попыток
    async fn bind(
        &self,
        endpoint: &Endpoint,
        principal: &str,
        password: &str,
    ) -> Result<Self::Session, String>;
}

impl<T: DirectoryConnector> DirectoryConnector for &T {
    type Session = T::Session;

    async fn bind(
        &self,
        endpoint: &Endpoint,
        principal: &str,
        password: &str,
    ) -> Result<Self::Session, String> {
        (**self).bind(endpoint, principal, password).await
    }
}

/// Аутентифицированная сессия каталога
#[allow(async_fn_in_trait)]
pub trait DirectorySession {
    /// Поиск по поддереву. Несуществующая база даёт пустой результат.
    async fn search(
        &mut self,
        base: &str,
        filter: &str,
        attrs: &[&str],
    ) -> Result<Vec<SearchEntry>, SearchError>;

    async fn close(&mut self) {}
}

/// Клиент каталога
pub struct DirectoryClient<C> {
    connector: C,
}

impl<C: DirectoryConnector> DirectoryClient<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    /// Перебирает [`BIND_PLAN`] до первого успешного bind
    pub async fn connect(&self, config: &ConnectionConfig) -> Result<C::Session, ConnectionError> {
        if config.password.is_empty() {
            return Err(ConnectionError::MissingPassword(config.username.clone()));
        }

        info!(server = %config.server, domain = %config.domain, user = %config.username, "Connecting to directory");

        let mut attempts = Vec::new();

        for attempt in BIND_PLAN {
            let principal = attempt.format.principal(config);
            let endpoint = Endpoint::new(config.server.clone(), attempt.transport);

            debug!(principal = %principal, url = %endpoint.url(), "Trying bind");

            match self
                .connector
                .bind(&endpoint, &principal, &config.password)
                .await
            {
                Ok(session) => {
                    info!(principal = %principal, transport = %attempt.transport, "Bound to directory");
                    return Ok(session);
                }
                Err(reason) => {
                    warn!(principal = %principal, transport = %attempt.transport, %reason, "Bind failed");
                    attempts.push(BindFailure {
                        principal,
                        transport: attempt.transport,
                        reason,
                    });
                }
            }
        }

        Err(ConnectionError::Exhausted {
            server: config.server.clone(),
            attempts,
        })
    }
}
