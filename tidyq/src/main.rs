mod config;
mod runner;

use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};
use std::io::Write;
use tidyq_client::ManagementClient;

fn setup_logger() {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));

    builder
        .format(|buf, record| {
            let lvl = buf.default_level_style(record.level()).bold();

            writeln!(
                buf,
                "{} - [{lvl}{:5}{lvl:#}] - {}",
                buf.timestamp_millis(),
                record.level(),
                record.args()
            )
        })
        .init();
}

#[tokio::main(flavor = "current_thread")]
pub async fn main() -> Result<()> {
    setup_logger();

    let config = config::resolve(config::CliConfig::parse())?;

    let client = ManagementClient::new(
        &config.management.url,
        &config.management.username,
        &config.management.password,
    )?;

    runner::tidy(&client, &config.tidy.prefix).await?;

    Ok(())
}
