// src/cli.rs

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{ArgAction, Parser};
use dialoguer::{Confirm, Input, MultiSelect, Password, Select};

use crate::config::{AppConfig, LoggingConfig};
use crate::deploy::{
    BatchReport, DeploymentWriter, NoRegistry, OutlookRegistry, SignatureRegistry,
    default_profiles_root,
};
use crate::directory::{
    ConnectionConfig, DirectoryClient, DirectorySession, LdapConnector, LdapSession, UserSearch,
    user_filter,
};
use crate::error::{AppError, ConfigError, ConnectionError};
use crate::logging::init_logging;
use crate::models::UserRecord;

/// Переменная окружения с паролем AD
pub const PASSWORD_ENV: &str = "SIGNDOMEN_PASSWORD";
pub const USERNAME_ENV: &str = "SIGNDOMEN_USERNAME";

type Writer = DeploymentWriter<Box<dyn SignatureRegistry>>;

// === CLI ===

#[derive(Parser)]
#[command(name = "signdomen")]
#[command(author, version, about = "Подписи Outlook из Active Directory", long_about = None)]
pub struct Cli {
    /// Путь к config.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Подробнее логи (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Subcommand)]
pub enum Command {
    /// Интерактивное меню (по умолчанию)
    Interactive {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Показать найденных пользователей
    List {
        #[command(flatten)]
        credentials: Credentials,
        #[command(flatten)]
        selection: Selection,
        #[arg(long)]
        json: bool,
    },
    /// Записать подписи в профили Outlook
    Deploy {
        #[command(flatten)]
        credentials: Credentials,
        #[command(flatten)]
        selection: Selection,
        #[command(flatten)]
        targets: Targets,
        /// Пользователь Windows, если отличается от sAMAccountName (только для одного --user)
        #[arg(long)]
        target: Option<String>,
    },
    /// Сохранить подписи в локальную папку
    Export {
        #[command(flatten)]
        credentials: Credentials,
        #[command(flatten)]
        selection: Selection,
        #[command(flatten)]
        targets: Targets,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Создать пример config.yaml
    InitConfig {
        #[arg(long, default_value = "config.yaml")]
        path: PathBuf,
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::Args, Clone, Default)]
pub struct Credentials {
    /// Имя пользователя AD
    #[arg(short, long, env = "SIGNDOMEN_USERNAME")]
    pub username: Option<String>,
}

#[derive(clap::Args, Clone, Default)]
pub struct Selection {
    /// Ключ сайта из секции `sites`; без него — весь домен
    #[arg(long)]
    pub site: Option<String>,
    /// Часть sAMAccountName, displayName или mail
    #[arg(short, long, default_value = "")]
    pub query: String,
}

#[derive(clap::Args, Clone, Default)]
pub struct Targets {
    /// sAMAccountName (можно несколько раз)
    #[arg(long = "user", conflicts_with = "all")]
    pub users: Vec<String>,
    /// Все найденные пользователи
    #[arg(long)]
    pub all: bool,
}

impl Cli {
    pub async fn run(self) -> Result<(), AppError> {
        let command = self.command.unwrap_or(Command::Interactive {
            credentials: Credentials::default(),
        });

        if let Command::InitConfig { path, force } = &command {
            init_logging(&LoggingConfig::default(), self.verbose);
            return init_config(path, *force);
        }

        let config = AppConfig::discover(self.config.as_deref())?;
        init_logging(&config.logging, self.verbose);

        match command {
            Command::Interactive { credentials } => interactive(&config, &credentials).await,
            Command::List {
                credentials,
                selection,
                json,
            } => {
                let (mut session, users) = fetch_users(&config, &credentials, &selection).await?;
                session.close().await;
                if json {
                    println!("{}", serde_json::to_string_pretty(&users)?);
                } else {
                    print_users(&users);
                }
                Ok(())
            }
            Command::Deploy {
                credentials,
                selection,
                targets,
                target,
            } => {
                let (mut session, users) = fetch_users(&config, &credentials, &selection).await?;
                session.close().await;
                let selected = select_targets(&users, &targets)?;
                let writer = build_writer(&config);

                if let Some(target) = target {
                    let [user] = selected.as_slice() else {
                        return Err(AppError::InvalidInput(
                            "--target requires exactly one --user".to_string(),
                        ));
                    };
                    deploy_one(&writer, user, Some(target.as_str()))?;
                    return Ok(());
                }

                let report = writer.deploy_many(selected);
                print_deploy_report(&report);
                ensure_complete(&report)
            }
            Command::Export {
                credentials,
                selection,
                targets,
                out,
            } => {
                let (mut session, users) = fetch_users(&config, &credentials, &selection).await?;
                session.close().await;
                let selected = select_targets(&users, &targets)?;
                let writer = build_writer(&config);
                let folder = out.unwrap_or_else(|| config.deployment.export_dir.clone());

                let report = writer.export_many(selected, &folder);
                print_export_report(&report, &folder);
                ensure_complete(&report)
            }
            Command::InitConfig { .. } => Ok(()),
        }
    }
}

// === Общие шаги ===

fn init_config(path: &Path, force: bool) -> Result<(), AppError> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()).into());
    }
    AppConfig::example().save(path)?;
    println!("✅ Пример конфигурации записан: {}", path.display());
    Ok(())
}

fn connector(config: &AppConfig) -> LdapConnector {
    LdapConnector {
        connect_timeout: Duration::from_secs(config.directory.connect_timeout_secs),
        tls_verify: config.directory.tls_verify,
        page_size: config.directory.page_size,
    }
}

fn build_writer(config: &AppConfig) -> Writer {
    let registry: Box<dyn SignatureRegistry> = if config.deployment.register_default {
        Box::new(OutlookRegistry::new(config.deployment.office_version.clone()))
    } else {
        Box::new(NoRegistry)
    };
    let profiles_root = config
        .deployment
        .profiles_root
        .clone()
        .unwrap_or_else(default_profiles_root);

    DeploymentWriter::new(config.company.clone(), profiles_root, registry)
}

fn password_from_env_or_prompt() -> Result<String, AppError> {
    match std::env::var(PASSWORD_ENV) {
        Ok(password) if !password.is_empty() => Ok(password),
        _ => Ok(Password::new().with_prompt("Пароль").interact()?),
    }
}

fn username_or_prompt(credentials: &Credentials) -> Result<String, AppError> {
    // Без подкоманды clap не читает SIGNDOMEN_USERNAME сам
    let from_env = std::env::var(USERNAME_ENV).ok();
    let username = credentials.username.as_deref().or(from_env.as_deref());

    match username.map(str::trim) {
        Some(username) if !username.is_empty() => Ok(username.to_string()),
        _ => Ok(Input::<String>::new()
            .with_prompt("Имя пользователя AD")
            .interact_text()?
            .trim()
            .to_string()),
    }
}

async fn connect(
    config: &AppConfig,
    base_dn: &str,
    credentials: &Credentials,
) -> Result<LdapSession, AppError> {
    let connection = ConnectionConfig {
        server: config.directory.server.clone(),
        domain: config.directory.domain.clone(),
        base_dn: base_dn.to_string(),
        username: username_or_prompt(credentials)?,
        password: password_from_env_or_prompt()?,
    };

    println!("\n→ Подключение к {} ({})", connection.server, connection.domain);

    let client = DirectoryClient::new(connector(config));
    match client.connect(&connection).await {
        Ok(session) => {
            println!("✓ Подключено к Active Directory");
            Ok(session)
        }
        Err(e) => {
            print_connection_hints(&e);
            Err(e.into())
        }
    }
}

async fn fetch_users(
    config: &AppConfig,
    credentials: &Credentials,
    selection: &Selection,
) -> Result<(LdapSession, Vec<UserRecord>), AppError> {
    let (site_name, base_dn) = config.site_base(selection.site.as_deref());
    println!("→ Сайт: {} ({})", site_name, base_dn);

    let mut session = connect(config, &base_dn, credentials).await?;
    let search = UserSearch::new(config.company.name.clone());
    let users = search_or_close(
        &search,
        &mut session,
        &base_dn,
        &user_filter(&selection.query),
    )
    .await?;

    println!("✓ Найдено пользователей с email: {}", users.len());
    Ok((session, users))
}

/// Поиск; при ошибке сессия закрывается до возврата ошибки
async fn search_or_close<S: DirectorySession>(
    search: &UserSearch,
    session: &mut S,
    base_dn: &str,
    filter: &str,
) -> Result<Vec<UserRecord>, AppError> {
    match search.search(session, base_dn, filter).await {
        Ok(users) => Ok(users),
        Err(e) => {
            session.close().await;
            Err(e.into())
        }
    }
}

/// Выбирает пользователей по `--user` или `--all`
pub fn select_targets<'a>(
    users: &'a [UserRecord],
    targets: &Targets,
) -> Result<Vec<&'a UserRecord>, AppError> {
    if targets.all {
        return Ok(users.iter().collect());
    }
    if targets.users.is_empty() {
        return Err(AppError::InvalidInput("pass --user NAME or --all".to_string()));
    }

    let mut selected = Vec::new();
    let mut unknown = Vec::new();
    for name in &targets.users {
        match users
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(name.trim()))
        {
            Some(user) => selected.push(user),
            None => unknown.push(name.as_str()),
        }
    }

    if !unknown.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "users not found: {}",
            unknown.join(", ")
        )));
    }
    Ok(selected)
}

fn ensure_complete<T>(report: &BatchReport<T>) -> Result<(), AppError> {
    match report.failed() {
        0 => Ok(()),
        failed => Err(AppError::Incomplete {
            failed,
            total: report.outcomes.len(),
        }),
    }
}

// === Интерактивный режим ===

const MENU: [&str; 4] = [
    "Обновить подпись одного пользователя",
    "Обновить подписи нескольких пользователей",
    "Сохранить подписи в локальную папку",
    "Выход",
];

async fn interactive(config: &AppConfig, credentials: &Credentials) -> Result<(), AppError> {
    if !(std::io::stdin().is_terminal() && std::io::stdout().is_terminal()) {
        return Err(AppError::InvalidInput(
            "interactive mode requires a terminal, use list/deploy/export instead".to_string(),
        ));
    }

    println!("╔══════════════════════════════════════════════╗");
    println!("║   Подписи Outlook из Active Directory        ║");
    println!("╚══════════════════════════════════════════════╝");
    println!("Сервер: {}", config.directory.server);
    println!("Домен: {}", config.directory.domain);
    println!("Base DN: {}", config.directory.base_dn);

    // Сайт
    let mut sites: Vec<String> = config
        .sites
        .iter()
        .map(|(key, site)| format!("{}. {}", key, site.name))
        .collect();
    sites.push("Все сайты".to_string());
    let choice = Select::new()
        .with_prompt("Сайт")
        .items(&sites)
        .default(sites.len() - 1)
        .interact()?;
    let key = config.sites.keys().nth(choice).map(String::as_str);
    let (site_name, base_dn) = config.site_base(key);
    println!("→ Сайт: {} ({})", site_name, base_dn);

    let mut session = connect(config, &base_dn, credentials).await?;

    let query: String = Input::new()
        .with_prompt("Фильтр поиска (пусто — все пользователи сайта)")
        .allow_empty(true)
        .interact_text()?;
    let filter = user_filter(&query);

    let search = UserSearch::new(config.company.name.clone());
    let mut users = search_or_close(&search, &mut session, &base_dn, &filter).await?;

    if users.is_empty() {
        println!("\n⚠ Пользователи не найдены. Возможные причины:");
        println!("  1. В Base DN нет пользователей с email");
        println!("  2. У учётной записи нет прав на чтение атрибутов");
        println!("  3. Пользователи находятся в другой OU");

        let retry = Confirm::new()
            .with_prompt("Попробовать другой Base DN?")
            .default(false)
            .interact()?;
        if retry {
            let new_base: String = Input::new()
                .with_prompt("Base DN (например OU=Users,DC=acme,DC=local)")
                .allow_empty(true)
                .interact_text()?;
            if !new_base.trim().is_empty() {
                users = search_or_close(&search, &mut session, new_base.trim(), &filter).await?;
            }
        }
    }

    // Дальше каталог не нужен
    session.close().await;

    if users.is_empty() {
        println!("Нечего обновлять.");
        return Ok(());
    }

    print_users(&users);
    let writer = build_writer(config);
    let items: Vec<String> = users.iter().map(user_line).collect();

    loop {
        let choice = Select::new()
            .with_prompt("Действие")
            .items(&MENU)
            .default(0)
            .interact()?;

        match choice {
            0 => {
                let idx = Select::new()
                    .with_prompt("Пользователь")
                    .items(&items)
                    .default(0)
                    .interact()?;
                let user = &users[idx];
                let target: String = Input::new()
                    .with_prompt("Пользователь Windows")
                    .default(user.username.clone())
                    .interact_text()?;
                if let Err(e) = deploy_one(&writer, user, Some(target.as_str())) {
                    eprintln!("✗ {}", e);
                }
            }
            1 => {
                let picked = MultiSelect::new()
                    .with_prompt("Пользователи (пробел — выбрать)")
                    .items(&items)
                    .interact()?;
                if picked.is_empty() {
                    println!("Никто не выбран");
                    continue;
                }
                println!("\n→ Обновление подписей для {} пользователей...", picked.len());
                let report = writer.deploy_many(picked.iter().map(|&i| &users[i]));
                print_deploy_report(&report);
            }
            2 => {
                let folder: String = Input::new()
                    .with_prompt("Папка")
                    .default(config.deployment.export_dir.display().to_string())
                    .interact_text()?;
                let folder = PathBuf::from(folder);

                let all = Confirm::new()
                    .with_prompt("Экспортировать всех?")
                    .default(true)
                    .interact()?;
                let picked: Vec<usize> = if all {
                    (0..users.len()).collect()
                } else {
                    MultiSelect::new()
                        .with_prompt("Пользователи (пробел — выбрать)")
                        .items(&items)
                        .interact()?
                };

                let report = writer.export_many(picked.iter().map(|&i| &users[i]), &folder);
                print_export_report(&report, &folder);
            }
            _ => {
                println!("\nДо свидания!");
                break;
            }
        }
    }

    Ok(())
}

fn deploy_one(writer: &Writer, user: &UserRecord, target: Option<&str>) -> Result<(), AppError> {
    println!("\n→ Обновление подписи: {}", user.label());
    let deployment = writer.deploy_to_profile(user, target)?;
    println!("  ✓ HTML: {}", deployment.html_path.display());
    println!("  ✓ TXT: {}", deployment.text_path.display());
    match deployment.registration_warning {
        None => println!("  ✓ Подпись установлена по умолчанию в Outlook"),
        Some(warning) => println!("  ⚠ Подпись не установлена по умолчанию: {}", warning),
    }
    println!("✅ Подпись обновлена для {}", user.label());
    Ok(())
}

// === Вывод ===

fn user_line(user: &UserRecord) -> String {
    format!("{:<15} {:<30} {}", user.username, user.label(), user.email)
}

fn print_users(users: &[UserRecord]) {
    if users.is_empty() {
        println!("Пользователи не найдены.");
        return;
    }

    println!("\n{}", "=".repeat(100));
    println!("{:<4} {:<15} {:<30} {:<35}", "#", "Username", "Имя", "Email");
    println!("{}", "=".repeat(100));
    for (idx, user) in users.iter().enumerate() {
        println!("{:<4} {}", idx + 1, user_line(user));
    }
    println!("{}\n", "=".repeat(100));
}

fn print_deploy_report<T>(report: &BatchReport<T>) {
    let total = report.outcomes.len();
    for (idx, (username, outcome)) in report.outcomes.iter().enumerate() {
        match outcome {
            Ok(_) => println!("  [{}/{}] {} ✓", idx + 1, total, username),
            Err(e) => println!("  [{}/{}] {} ✗ {}", idx + 1, total, username, e),
        }
    }
    println!("\n✓ Готово: {} из {} подписей записано", report.succeeded(), total);
}

fn print_export_report(report: &BatchReport<PathBuf>, folder: &Path) {
    println!("\n→ Сохранение {} подписей в {}", report.outcomes.len(), folder.display());
    for (username, outcome) in &report.outcomes {
        match outcome {
            Ok(path) => println!("  ✓ {}: {}", username, path.display()),
            Err(e) => println!("  ✗ {}: {}", username, e),
        }
    }
    println!("\n✓ {} подписей сохранено", report.succeeded());
}

const CONNECTION_HINTS: [&str; 5] = [
    "Сервер AD доступен по сети",
    "Имя пользователя и пароль",
    "Firewall пропускает LDAP (порты 389/636)",
    "Попробуйте IP сервера вместо DNS-имени",
    "У учётной записи есть права на чтение AD",
];

/// Подсказки после неудачного подключения. Саму ошибку печатает `main`.
fn connection_hints(error: &ConnectionError) -> &'static [&'static str] {
    match error {
        ConnectionError::Exhausted { .. } => &CONNECTION_HINTS,
        ConnectionError::MissingPassword(_) => &[],
    }
}

fn print_connection_hints(error: &ConnectionError) {
    let hints = connection_hints(error);
    if hints.is_empty() {
        return;
    }
    eprintln!("\n🔍 Проверьте:");
    for (i, hint) in hints.iter().enumerate() {
        eprintln!("  {}. {}", i + 1, hint);
    }
}
