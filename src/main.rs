use registry_transfer::cli::{Args, Runner};
use registry_transfer::logging::init_tracing;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse_args();

    let runner = match Runner::new(args) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(runner.logger());

    match runner.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            runner.logger().error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
