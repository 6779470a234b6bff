// src/deploy.rs

//! Запись подписей: в профиль Outlook пользователя или в локальную папку.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, warn};

use crate::error::{RegistrationWarning, WriteError};
use crate::models::{CompanyInfo, UserRecord};
use crate::signature::{render_html, render_text, signature_name};

/// Имена файлов при экспорте в папку
pub const EXPORT_HTML_FILE: &str = "firma.htm";
pub const EXPORT_TEXT_FILE: &str = "firma.txt";

/// Путь к подписям Outlook внутри профиля
const SIGNATURES_SUBDIR: [&str; 4] = ["AppData", "Roaming", "Microsoft", "Signatures"];

/// Регистрация подписи по умолчанию для новых писем и ответов
pub trait SignatureRegistry {
    fn register_default(&self, signature_name: &str) -> Result<(), RegistrationWarning>;
}

impl<T: SignatureRegistry + ?Sized> SignatureRegistry for Box<T> {
    fn register_default(&self, signature_name: &str) -> Result<(), RegistrationWarning> {
        (**self).register_default(signature_name)
    }
}

impl<T: SignatureRegistry + ?Sized> SignatureRegistry for &T {
    fn register_default(&self, signature_name: &str) -> Result<(), RegistrationWarning> {
        (**self).register_default(signature_name)
    }
}

/// Реестр Windows через `reg.exe`:
/// `HKCU\Software\Microsoft\Office\<version>\Common\MailSettings`
#[derive(Debug, Clone)]
pub struct OutlookRegistry {
    pub office_version: String,
}

impl OutlookRegistry {
    pub fn new(office_version: impl Into<String>) -> Self {
        Self {
            office_version: office_version.into(),
        }
    }

    pub fn key_path(&self) -> String {
        format!(
            "HKCU\\Software\\Microsoft\\Office\\{}\\Common\\MailSettings",
            self.office_version
        )
    }

    fn set_value(&self, value: &str, data: &str) -> Result<(), RegistrationWarning> {
        let output = Command::new("reg")
            .args(["add", &self.key_path(), "/v", value, "/t", "REG_SZ", "/d", data, "/f"])
            .output()?;

        if output.status.success() {
            Ok(())
        } else {
            Err(RegistrationWarning::Rejected {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

impl SignatureRegistry for OutlookRegistry {
    fn register_default(&self, signature_name: &str) -> Result<(), RegistrationWarning> {
        if !cfg!(windows) {
            return Err(RegistrationWarning::Unsupported);
        }
        self.set_value("NewSignature", signature_name)?;
        self.set_value("ReplySignature", signature_name)
    }
}

/// Регистрация отключена
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRegistry;

impl SignatureRegistry for NoRegistry {
    fn register_default(&self, _signature_name: &str) -> Result<(), RegistrationWarning> {
        Ok(())
    }
}

/// Результат записи в профиль
#[derive(Debug)]
pub struct ProfileDeployment {
    pub html_path: PathBuf,
    pub text_path: PathBuf,
    /// `Some`, если подпись не удалось сделать подписью по умолчанию
    pub registration_warning: Option<RegistrationWarning>,
}

/// Итог пакетной операции
#[derive(Debug)]
pub struct BatchReport<T> {
    pub outcomes: Vec<(String, Result<T, WriteError>)>,
}

impl<T> BatchReport<T> {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|(_, r)| r.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Папка профилей по умолчанию: родитель домашней папки (`C:\Users` на Windows)
pub fn default_profiles_root() -> PathBuf {
    dirs::home_dir()
        .and_then(|home| home.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("C:\\Users"))
}

/// Имя пользователя должно быть одним компонентом пути
pub fn validate_identity(identity: &str) -> Result<(), WriteError> {
    let invalid = identity.trim().is_empty()
        || identity == "."
        || identity == ".."
        || identity.contains(['/', '\\', ':']);
    if invalid {
        return Err(WriteError::InvalidIdentity(identity.to_string()));
    }
    Ok(())
}

/// Пишет файлы подписи
pub struct DeploymentWriter<R> {
    company: CompanyInfo,
    profiles_root: PathBuf,
    registry: R,
}

impl<R: SignatureRegistry> DeploymentWriter<R> {
    pub fn new(company: CompanyInfo, profiles_root: impl Into<PathBuf>, registry: R) -> Self {
        Self {
            company,
            profiles_root: profiles_root.into(),
            registry,
        }
    }

    pub fn company(&self) -> &CompanyInfo {
        &self.company
    }

    /// Папка подписей Outlook для пользователя Windows
    pub fn signature_folder(&self, identity: &str) -> PathBuf {
        let mut path = self.profiles_root.join(identity);
        for part in SIGNATURES_SUBDIR {
            path.push(part);
        }
        path
    }

    /// Записывает подпись в профиль `target` (по умолчанию `user.username`).
    /// Ошибка регистрации в реестре не делает операцию неуспешной.
    pub fn deploy_to_profile(
        &self,
        user: &UserRecord,
        target: Option<&str>,
    ) -> Result<ProfileDeployment, WriteError> {
        let identity = target
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(user.username.as_str());
        validate_identity(identity)?;

        let folder = self.signature_folder(identity);
        create_dir(&folder)?;

        let name = signature_name(&self.company);
        let html_path = folder.join(format!("{}.htm", name));
        let text_path = folder.join(format!("{}.txt", name));

        write_file(&html_path, &render_html(user, &self.company))?;
        write_file(&text_path, &render_text(user, &self.company))?;
        info!(identity = %identity, folder = %folder.display(), "Signature written to profile");

        let registration_warning = match self.registry.register_default(&name) {
            Ok(()) => None,
            Err(warning) => {
                warn!(identity = %identity, %warning, "Could not set default signature");
                Some(warning)
            }
        };

        Ok(ProfileDeployment {
            html_path,
            text_path,
            registration_warning,
        })
    }

    /// Сохраняет подпись в `<folder>/<username>/firma.{htm,txt}`
    pub fn export_to_folder(&self, user: &UserRecord, folder: &Path) -> Result<PathBuf, WriteError> {
        validate_identity(&user.username)?;

        let user_folder = folder.join(&user.username);
        create_dir(&user_folder)?;

        write_file(
            &user_folder.join(EXPORT_HTML_FILE),
            &render_html(user, &self.company),
        )?;
        write_file(
            &user_folder.join(EXPORT_TEXT_FILE),
            &render_text(user, &self.company),
        )?;

        info!(username = %user.username, folder = %user_folder.display(), "Signature exported");
        Ok(user_folder)
    }

    /// Последовательно записывает подписи в профили пользователей
    pub fn deploy_many<'a, I>(&self, users: I) -> BatchReport<ProfileDeployment>
    where
        I: IntoIterator<Item = &'a UserRecord>,
    {
        BatchReport {
            outcomes: users
                .into_iter()
                .map(|user| (user.username.clone(), self.deploy_to_profile(user, None)))
                .collect(),
        }
    }

    /// Последовательно экспортирует подписи в папку
    pub fn export_many<'a, I>(&self, users: I, folder: &Path) -> BatchReport<PathBuf>
    where
        I: IntoIterator<Item = &'a UserRecord>,
    {
        BatchReport {
            outcomes: users
                .into_iter()
                .map(|user| (user.username.clone(), self.export_to_folder(user, folder)))
                .collect(),
        }
    }
}

fn create_dir(path: &Path) -> Result<(), WriteError> {
    fs::create_dir_all(path).map_err(|source| WriteError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, content: &str) -> Result<(), WriteError> {
    fs::write(path, content).map_err(|source| WriteError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identities_must_be_single_path_components() {
        assert!(validate_identity("jdoe").is_ok());
        assert!(validate_identity("j.doe").is_ok());
        assert!(validate_identity("j..doe").is_ok());
        for bad in ["", "  ", ".", "..", "../etc", "a/b", "a\\b", "C:"] {
            assert!(validate_identity(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn signature_folder_layout() {
        let writer = DeploymentWriter::new(CompanyInfo::default(), "/profiles", NoRegistry);
        let folder = writer.signature_folder("jdoe");
        let parts: Vec<String> = folder
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            parts[parts.len() - 5..],
            ["jdoe", "AppData", "Roaming", "Microsoft", "Signatures"]
        );
    }

    #[test]
    fn registry_key_path() {
        assert_eq!(
            OutlookRegistry::new("16.0").key_path(),
            "HKCU\\Software\\Microsoft\\Office\\16.0\\Common\\MailSettings"
        );
    }

    #[cfg(not(windows))]
    #[test]
    fn registry_is_unsupported_off_windows() {
        assert!(matches!(
            OutlookRegistry::new("16.0").register_default("Firma-Acme"),
            Err(RegistrationWarning::Unsupported)
        ));
    }
}
