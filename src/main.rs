use clap::Parser;

#[tokio::main]
async fn main() {
    let env_file = match dotenvy::dotenv() {
        Ok(path) => Some(path),
        Err(e) if e.not_found() => None,
        Err(e) => {
            eprintln!("Warning: could not load .env file: {e}");
            None
        }
    };

    let cli = edge_gateway::cli::Cli::parse();
    if let Err(e) = edge_gateway::cmd::dispatch(cli, env_file).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
