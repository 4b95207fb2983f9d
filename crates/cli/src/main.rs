use std::process::ExitCode;

fn main() -> ExitCode {
    packquote_cli::run()
}
