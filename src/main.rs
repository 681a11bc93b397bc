mod cli;

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine, credentials may come from the real environment
    dotenvy::dotenv().ok();
    env_logger::init();

    match cli::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
