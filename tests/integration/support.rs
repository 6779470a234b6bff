// tests/integration/support.rs

use std::collections::HashMap;
use std::sync::Mutex;

use ldap3::SearchEntry;
use signdomen::directory::{DirectoryConnector, DirectorySession, Endpoint, Transport};
use signdomen::error::SearchError;

/// Принимает bind только для перечисленных (principal, transport)
#[derive(Default)]
pub struct MockConnector {
    pub accepts: Vec<(String, Transport)>,
    pub attempts: Mutex<Vec<(String, Transport)>>,
}

impl MockConnector {
    pub fn accepting(principal: &str, transport: Transport) -> Self {
        Self {
            accepts: vec![(principal.to_string(), transport)],
            ..Default::default()
        }
    }

    pub fn attempts(&self) -> Vec<(String, Transport)> {
        self.attempts.lock().unwrap().clone()
    }
}

impl DirectoryConnector for MockConnector {
    type Session = MockSession;

    async fn bind(
        &self,
        endpoint: &Endpoint,
        principal: &str,
        _password: &str,
    ) -> Result<MockSession, String> {
        let attempt = (principal.to_string(), endpoint.transport);
        self.attempts.lock().unwrap().push(attempt.clone());

        if self.accepts.contains(&attempt) {
            Ok(MockSession::default())
        } else {
            Err("invalid credentials".to_string())
        }
    }
}

/// Отдаёт заранее заданные записи по base DN и запоминает запросы
#[derive(Default)]
pub struct MockSession {
    pub by_base: HashMap<String, Vec<SearchEntry>>,
    pub searched: Vec<String>,
    pub reject: bool,
}

impl MockSession {
    pub fn with_base(mut self, base: &str, entries: Vec<SearchEntry>) -> Self {
        self.by_base.insert(base.to_string(), entries);
        self
    }
}

impl DirectorySession for MockSession {
    async fn search(
        &mut self,
        base: &str,
        _filter: &str,
        _attrs: &[&str],
    ) -> Result<Vec<SearchEntry>, SearchError> {
        self.searched.push(base.to_string());
        if self.reject {
            return Err(SearchError::Rejected {
                base: base.to_string(),
                rc: 50,
                text: "insufficientAccessRights".to_string(),
            });
        }
        Ok(self.by_base.get(base).cloned().unwrap_or_default())
    }
}

pub fn entry(username: &str, mail: Option<&str>) -> SearchEntry {
    let mut attrs = HashMap::new();
    attrs.insert("sAMAccountName".to_string(), vec![username.to_string()]);
    attrs.insert("displayName".to_string(), vec![format!("{} (Carton Group)", username)]);
    if let Some(mail) = mail {
        attrs.insert("mail".to_string(), vec![mail.to_string()]);
    }
    SearchEntry {
        dn: format!("CN={},DC=acme,DC=local", username),
        attrs,
        bin_attrs: HashMap::new(),
    }
}
