use std::process::ExitCode;

fn main() -> ExitCode {
    match xodr_transform::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
