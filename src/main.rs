use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    price_monitor_lib::run().await
}
