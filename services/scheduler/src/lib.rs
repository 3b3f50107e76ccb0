mod cli;
mod runner;

use registration_tasks::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
