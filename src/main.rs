use anyhow::Result;
use clap::Parser;

use habitr::{cli, config, db};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    config::init_logging();
    let cli_opts = cli::Cli::parse();
    let config = config::Config::load(cli_opts.db);
    let conn = db::init(&config.db_path)?;
    let command = cli_opts.command.unwrap_or(cli::Command::Due { date: None });
    cli::run(command, &conn)
}
