use std::process::ExitCode;

fn main() -> ExitCode {
    match pactsmith::cli::run() {
        Ok(()) => ExitCode::from(pactsmith::errors::EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::from(pactsmith::errors::get_exit_code(&e))
        }
    }
}
