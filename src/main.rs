use std::process::ExitCode;

fn main() -> ExitCode {
    match patient_records_lib::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{} failed: {e}", patient_records_lib::config::APP_NAME);
            ExitCode::FAILURE
        }
    }
}
