mod batch;
mod cli;
mod coordinator;
mod infra;
mod routes;
mod server;

use club_allocator::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
