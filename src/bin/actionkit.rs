use actionkit::app::command_handlers::run_cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run_cli(std::env::args().skip(1).collect()) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("actionkit: {err}");
            ExitCode::FAILURE
        }
    }
}
