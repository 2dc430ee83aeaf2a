mod cli;
mod commands;

use program_export::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
