// src/lib.rs

//! Генератор подписей Outlook по данным Active Directory.
//!
//! Цепочка: [`directory::DirectoryClient`] подключается к каталогу,
//! [`directory::UserSearch`] читает пользователей, [`signature`] рендерит
//! HTML и текст, [`deploy::DeploymentWriter`] раскладывает файлы.

pub mod cli;
pub mod config;
pub mod deploy;
pub mod directory;
pub mod error;
pub mod logging;
pub mod models;
pub mod signature;
