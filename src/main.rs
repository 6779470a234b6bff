// src/main.rs

use std::process::ExitCode;

use clap::Parser;
use signdomen::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    // .env с SIGNDOMEN_USERNAME / SIGNDOMEN_PASSWORD, если есть
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\n✗ Ошибка: {}", e);
            ExitCode::FAILURE
        }
    }
}
