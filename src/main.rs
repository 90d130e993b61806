use clap::Parser;
use rxwatch::cli::{
    analytics, handle_config_init, health, search, watch, Cli, Commands, ConfigCommands,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Watch(args) => watch::run_watch(args).await,
        Commands::Search(args) => search::handle_search(&args).await.map(|output| {
            println!("{}", output);
        }),
        Commands::Analytics(args) => analytics::handle_analytics(&args).await.map(|output| {
            println!("{}", output);
        }),
        Commands::Health(args) => health::handle_health(&args).await.map(|output| {
            println!("{}", output);
        }),
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
