// src/directory/search.rs

use ldap3::{SearchEntry, ldap_escape};
use tracing::{debug, info, warn};

use super::DirectorySession;
use crate::error::{AttributeError, SearchError};
use crate::models::UserRecord;

/// Запрашиваемые атрибуты пользователя
pub const USER_ATTRIBUTES: [&str; 11] = [
    "sAMAccountName",
    "displayName",
    "givenName",
    "sn",
    "title",
    "mail",
    "telephoneNumber",
    "mobile",
    "department",
    "company",
    "physicalDeliveryOfficeName",
];

/// Фильтр по умолчанию: все пользователи с почтой
pub const DEFAULT_FILTER: &str = "(&(objectClass=user)(mail=*))";

/// Строит LDAP-фильтр по строке поиска оператора.
/// Пустая строка даёт [`DEFAULT_FILTER`].
pub fn user_filter(query: &str) -> String {
    let query = query.trim();
    if query.is_empty() {
        return DEFAULT_FILTER.to_string();
    }

    let q = ldap_escape(query);
    format!(
        "(&(objectClass=user)(|(sAMAccountName=*{q}*)(displayName=*{q}*)(mail=*{q}*)))"
    )
}

/// Запасная база: контейнер Users под исходной базой.
/// Это эвристика, в реальной топологии его может не быть.
pub fn alternate_base(base_dn: &str) -> String {
    format!("OU=Users,{}", base_dn)
}

/// Значение атрибута: первое непустое значение без пробелов по краям
pub fn lookup_attribute(entry: &SearchEntry, name: &str) -> Result<String, AttributeError> {
    let values = entry
        .attrs
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, values)| values);

    match values {
        Some(values) => values
            .iter()
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| AttributeError::Empty(name.to_string())),
        None if entry
            .bin_attrs
            .keys()
            .any(|key| key.eq_ignore_ascii_case(name)) =>
        {
            Err(AttributeError::Binary(name.to_string()))
        }
        None => Err(AttributeError::Missing(name.to_string())),
    }
}

/// То же, но любая ошибка превращается в пустую строку
pub fn attribute_or_default(entry: &SearchEntry, name: &str) -> String {
    match lookup_attribute(entry, name) {
        Ok(value) => value,
        Err(err @ AttributeError::Binary(_)) => {
            warn!(dn = %entry.dn, error = %err, "Attribute ignored");
            String::new()
        }
        Err(err) => {
            debug!(dn = %entry.dn, error = %err, "Attribute defaulted to empty");
            String::new()
        }
    }
}

/// Нормализует запись каталога. Проверку email не делает.
pub fn user_from_entry(entry: &SearchEntry, default_company: &str) -> UserRecord {
    let company = attribute_or_default(entry, "company");

    UserRecord {
        username: attribute_or_default(entry, "sAMAccountName"),
        display_name: attribute_or_default(entry, "displayName"),
        first_name: attribute_or_default(entry, "givenName"),
        last_name: attribute_or_default(entry, "sn"),
        title: attribute_or_default(entry, "title"),
        email: attribute_or_default(entry, "mail"),
        phone: attribute_or_default(entry, "telephoneNumber"),
        mobile: attribute_or_default(entry, "mobile"),
        department: attribute_or_default(entry, "department"),
        company: if company.is_empty() {
            default_company.to_string()
        } else {
            company
        },
        office: attribute_or_default(entry, "physicalDeliveryOfficeName"),
    }
}

/// Поиск пользователей
#[derive(Debug, Clone)]
pub struct UserSearch {
    default_company: String,
}

impl UserSearch {
    pub fn new(default_company: impl Into<String>) -> Self {
        Self {
            default_company: default_company.into(),
        }
    }

    /// Ищет пользователей под `base_dn`. Если там пусто, один раз
    /// повторяет поиск в [`alternate_base`]. Порядок записей сохраняется.
    pub async fn search<S: DirectorySession>(
        &self,
        session: &mut S,
        base_dn: &str,
        filter: &str,
    ) -> Result<Vec<UserRecord>, SearchError> {
        info!(base = %base_dn, filter = %filter, "Searching users");

        let mut entries = session.search(base_dn, filter, &USER_ATTRIBUTES).await?;

        if entries.is_empty() {
            let alt = alternate_base(base_dn);
            info!(base = %alt, "No entries under base DN, trying alternate base");
            entries = session.search(&alt, filter, &USER_ATTRIBUTES).await?;
        }

        let total = entries.len();
        let users: Vec<UserRecord> = entries
            .iter()
            .map(|entry| user_from_entry(entry, &self.default_company))
            .filter(|user| {
                let keep = user.has_valid_email();
                if !keep {
                    debug!(username = %user.username, "Skipping entry without valid email");
                }
                keep
            })
            .collect();

        info!(entries = total, users = users.len(), "Users with valid email");
        Ok(users)
    }
}
