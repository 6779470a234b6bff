// tests/integration/main.rs

mod connect;
mod deploy;
mod search;
mod support;
