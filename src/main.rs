use std::process::ExitCode;

fn main() -> ExitCode {
    match chat_filter::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
