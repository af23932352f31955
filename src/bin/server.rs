use clap::Parser;
use redstore::{server, DEFAULT_PORT};

/// The SIGINT signal number, forwarded as the exit status after an orderly
/// shutdown.
const SIGINT: i32 = 2;

#[derive(Parser, Debug)]
struct Args {
    /// The port to listen on
    #[arg(default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = server::run(args.port).await {
        eprintln!("server error: {}", e);
        std::process::exit(1);
    }

    // The accept loop only returns cleanly after SIGINT.
    std::process::exit(SIGINT);
}
