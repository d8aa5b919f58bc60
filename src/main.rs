use clap::Parser;
use dotenv::dotenv;
use modelprobe::cli::{Cli, Command, RunArgs};
use modelprobe::{init_logging, list_models, load_app_config, run_probe};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from `.env` file into std::env (optional)
    dotenv().ok();

    let cli = Cli::parse();
    let mut cfg = load_app_config(cli.config.as_deref())?;

    match cli.command.unwrap_or_else(|| Command::Run(RunArgs::default())) {
        Command::Run(args) => {
            args.apply(&mut cfg);
            init_logging(&cfg.logging);
            run_probe(&cfg).await?;
        }
        Command::Models(args) => {
            args.apply(&mut cfg);
            init_logging(&cfg.logging);
            for model in list_models(&cfg).await? {
                println!("{}", model);
            }
        }
    }
    Ok(())
}
