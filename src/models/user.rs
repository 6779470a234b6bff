// src/models/user.rs

use serde::{Deserialize, Serialize};

/// Пользователь, прочитанный из Active Directory.
/// Отсутствующее значение хранится как пустая строка.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRecord {
    /// sAMAccountName
    pub username: String,
    pub display_name: String,
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub email: String,
    pub phone: String,
    pub mobile: String,
    pub department: String,
    pub company: String,
    /// physicalDeliveryOfficeName
    pub office: String,
}

impl UserRecord {
    /// Запись пригодна для подписи, только если есть email с `@`
    pub fn has_valid_email(&self) -> bool {
        !self.email.is_empty() && self.email.contains('@')
    }

    /// Имя для вывода в таблице: displayName, иначе username
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.username
        } else {
            &self.display_name
        }
    }
}
