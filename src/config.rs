// src/config.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::models::CompanyInfo;

/// Префикс переменных окружения: `SIGNDOMEN_DIRECTORY__SERVER=...`
pub const ENV_PREFIX: &str = "SIGNDOMEN";

pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub directory: DirectoryConfig,

    /// Сайты (OU) для выбора в меню, ключ — номер пункта
    #[serde(default)]
    pub sites: BTreeMap<String, SiteConfig>,

    #[serde(default)]
    pub company: CompanyInfo,

    #[serde(default)]
    pub deployment: DeploymentConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DirectoryConfig {
    pub server: String,
    pub domain: String,
    pub base_dn: String,
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_page_size")]
    pub page_size: i32,
}

fn default_tls_verify() -> bool { true }
fn default_connect_timeout_secs() -> u64 { 10 }
fn default_page_size() -> i32 { 500 }

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    pub name: String,
    pub ou: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DeploymentConfig {
    /// Папка с профилями пользователей, по умолчанию `C:\Users`
    pub profiles_root: Option<PathBuf>,
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
    #[serde(default = "default_office_version")]
    pub office_version: String,
    #[serde(default = "default_register_default")]
    pub register_default: bool,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            profiles_root: None,
            export_dir: default_export_dir(),
            office_version: default_office_version(),
            register_default: default_register_default(),
        }
    }
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("./firme")
}

fn default_office_version() -> String {
    "16.0".to_string()
}

fn default_register_default() -> bool { true }

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl AppConfig {
    /// Загружает YAML-файл и накладывает переменные окружения `SIGNDOMEN_*`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::load_with(path.as_ref(), environment())
    }

    fn load_with(path: &Path, env: config::Environment) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(
                config::File::new(&path.to_string_lossy(), config::FileFormat::Yaml).required(true),
            )
            .add_source(env)
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Ищет конфигурацию: явный путь, затем `./config.yaml`,
    /// затем `<config_dir>/signdomen/config.yaml`
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let candidates = match explicit {
            Some(path) => vec![path.to_path_buf()],
            None => candidate_paths(),
        };

        match candidates.iter().find(|p| p.is_file()) {
            Some(path) => Self::load(path),
            None => Err(ConfigError::NotFound(candidates)),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Пример конфигурации для `init-config`
    pub fn example() -> Self {
        let mut sites = BTreeMap::new();
        sites.insert(
            "1".to_string(),
            SiteConfig {
                name: "Sede Principale".to_string(),
                ou: "OU=Principale,OU=Client,DC=tuaazienda,DC=local".to_string(),
            },
        );
        sites.insert(
            "2".to_string(),
            SiteConfig {
                name: "Sede Secondaria".to_string(),
                ou: "OU=Secondaria,OU=Client,DC=tuaazienda,DC=local".to_string(),
            },
        );

        Self {
            directory: DirectoryConfig {
                server: "dc.tuaazienda.local".to_string(),
                domain: "TUODOMINIO".to_string(),
                base_dn: "DC=tuaazienda,DC=local".to_string(),
                tls_verify: default_tls_verify(),
                connect_timeout_secs: default_connect_timeout_secs(),
                page_size: default_page_size(),
            },
            sites,
            company: CompanyInfo::default(),
            deployment: DeploymentConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Base DN для сайта; неизвестный ключ или `None` — весь домен
    pub fn site_base(&self, key: Option<&str>) -> (String, String) {
        match key.and_then(|k| self.sites.get(k)) {
            Some(site) => (site.name.clone(), site.ou.clone()),
            None => ("Все сайты".to_string(), self.directory.base_dn.clone()),
        }
    }
}

/// `SIGNDOMEN_` отделяется одним `_`, уровни вложенности двумя
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(DEFAULT_CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("signdomen").join(DEFAULT_CONFIG_FILE));
    }
    paths
}
