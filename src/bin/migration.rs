use anyhow::{bail, Context};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use satorial_api::{config, db, migrator::Migrator};

/// Applies (`up`, the default), reverts (`down [n]`) or lists (`status`)
/// the embedded schema migrations against the configured database.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_else(|| "up".to_string());

    if command == "up" {
        return satorial_api::migrator::run_migration(cfg.database_url()).await;
    }

    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to database")?;

    match command.as_str() {
        "down" => {
            let steps = match args.next() {
                Some(raw) => raw
                    .parse::<u32>()
                    .with_context(|| format!("invalid step count '{}'", raw))?,
                None => 1,
            };
            info!("Reverting {} migration(s)", steps);
            Migrator::down(&pool, Some(steps)).await?;
        }
        "status" => Migrator::status(&pool).await?,
        other => bail!("unknown command '{}'; expected up, down [n] or status", other),
    }

    Ok(())
}
