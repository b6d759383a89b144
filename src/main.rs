use clap::Parser;

use reelsmith::cli::{self, Args, CliError, Command};
use reelsmith::config::{self, Config};

fn load_env() {
    // Load .env file, don't override existing env vars
    // dotenv::dotenv() returns Err if .env doesn't exist, which is fine
    let _ = dotenv::dotenv();
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() {
    // Load .env file before anything else
    load_env();
    init_logging();

    let args = Args::parse();
    let config_path = args.config.clone().unwrap_or_else(config::default_path);

    let mut cfg = match Config::load(Some(&config_path)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    cfg.apply_env_overrides();

    let code = match args.command {
        Command::Render { products, output } => {
            match cli::render(&cfg, &products, output).await {
                Ok(_) => 0,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    1
                }
            }
        }
        Command::Publish {
            video_url,
            caption,
            strict,
        } => match cli::publish(&cfg, &video_url, caption).await {
            Ok(outcome) => cli::publish_exit_code(&outcome, strict),
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Command::Config { action } => {
            match cli::handle_config_action(action, &cfg, &config_path) {
                Ok(()) => 0,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    if matches!(e, CliError::ConfigExists(_)) {
                        eprintln!("Use 'reelsmith config show' to view current settings.");
                    }
                    1
                }
            }
        }
    };

    std::process::exit(code);
}
