use std::process::ExitCode;

fn main() -> ExitCode {
    match latency_fit::logging::init().and_then(|()| latency_fit::app::run()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
