mod cli;

#[tokio::main]
async fn main() {
    if let Err(err) = eventify::telemetry::init_tracing() {
        eprintln!("failed to initialise logging: {err}");
    }

    match cli::run().await {
        cli::RunOutcome::Serve(config) => {
            let state = eventify::worker_state(config);
            if let Err(err) = eventify::serve(state).await {
                eprintln!("worker server error: {err}");
                std::process::exit(1);
            }
        }
        cli::RunOutcome::Exit(code) => std::process::exit(code),
    }
}
