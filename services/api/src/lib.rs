mod cli;
mod infra;
mod routes;
mod server;

use waste_tips::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
