use std::process::ExitCode;

fn main() -> ExitCode {
    booksum_cli::run()
}
