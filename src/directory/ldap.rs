// src/directory/ldap.rs

use std::time::Duration;

use ldap3::adapters::{Adapter, EntriesOnly, PagedResults};
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use tracing::{debug, warn};

use super::{DirectoryConnector, DirectorySession, Endpoint};
use crate::error::SearchError;

/// LDAP result codes, которые обрабатываются особо
const RC_SUCCESS: u32 = 0;
const RC_SIZE_LIMIT_EXCEEDED: u32 = 4;
const RC_NO_SUCH_OBJECT: u32 = 32;

/// Настройки соединения ldap3
#[derive(Debug, Clone)]
pub struct LdapConnector {
    pub connect_timeout: Duration,
    pub tls_verify: bool,
    pub page_size: i32,
}

impl Default for LdapConnector {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            tls_verify: true,
            page_size: 500,
        }
    }
}

impl DirectoryConnector for LdapConnector {
    type Session = LdapSession;

    async fn bind(
        &self,
        endpoint: &Endpoint,
        principal: &str,
        password: &str,
    ) -> Result<LdapSession, String> {
        let url = endpoint.url();

        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.connect_timeout)
            .set_no_tls_verify(!self.tls_verify);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| format!("cannot reach {}: {}", url, e))?;

        // Драйвер соединения
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        let result = ldap
            .simple_bind(principal, password)
            .await
            .map_err(|e| e.to_string())?;

        if result.rc != RC_SUCCESS {
            // 49 = invalidCredentials
            let _ = ldap.unbind().await;
            return Err(format!("bind rejected with code {}: {}", result.rc, result.text));
        }

        Ok(LdapSession {
            ldap,
            page_size: self.page_size,
        })
    }
}

/// Живая сессия ldap3
pub struct LdapSession {
    ldap: Ldap,
    page_size: i32,
}

impl DirectorySession for LdapSession {
    async fn search(
        &mut self,
        base: &str,
        filter: &str,
        attrs: &[&str],
    ) -> Result<Vec<SearchEntry>, SearchError> {
        let transport = |source: ldap3::LdapError| SearchError::Transport {
            base: base.to_string(),
            source,
        };

        let adapters: Vec<Box<dyn Adapter<_, _>>> = vec![
            Box::new(EntriesOnly::new()),
            Box::new(PagedResults::new(self.page_size)),
        ];

        let mut stream = self
            .ldap
            .streaming_search_with(adapters, base, Scope::Subtree, filter, attrs.to_vec())
            .await
            .map_err(transport)?;

        let mut entries = Vec::new();
        while let Some(entry) = stream.next().await.map_err(transport)? {
            entries.push(SearchEntry::construct(entry));
        }

        let result = stream.finish().await;
        debug!(base = %base, rc = result.rc, count = entries.len(), "Search finished");

        classify(base, result.rc, result.text, entries)
    }

    async fn close(&mut self) {
        if let Err(e) = self.ldap.unbind().await {
            debug!(error = %e, "Unbind failed");
        }
    }
}

/// Итог поиска по коду результата: 4 оставляет частичный результат,
/// 32 (нет такой базы) считается пустым результатом
fn classify(
    base: &str,
    rc: u32,
    text: String,
    entries: Vec<SearchEntry>,
) -> Result<Vec<SearchEntry>, SearchError> {
    match rc {
        RC_SUCCESS => Ok(entries),
        RC_SIZE_LIMIT_EXCEEDED => {
            warn!(base = %base, count = entries.len(), "Size limit exceeded, result is partial");
            Ok(entries)
        }
        RC_NO_SUCH_OBJECT => {
            debug!(base = %base, "Base DN does not exist");
            Ok(Vec::new())
        }
        rc => Err(SearchError::Rejected {
            base: base.to_string(),
            rc,
            text,
        }),
    }
}
