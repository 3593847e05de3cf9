use lockbox::countdown::Countdown;
use lockbox::units::format_eth;
use lockbox::{LockboxConfig, LockboxManager};

/// One-shot status report: validate the environment, sync the mirror once,
/// and print the account state with its countdown.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = LockboxConfig::from_env();
    let report = config.validate();
    report.log();
    if report.is_strict && !report.is_valid() {
        anyhow::bail!("invalid configuration in CI/production context, refusing to start");
    }

    let manager = LockboxManager::new(config)?;
    let snapshot = manager.refresh_all().await;

    match snapshot.balance {
        Some(wei) => log::info!("Balance: {} ETH", format_eth(wei)),
        None => log::warn!("Balance: not loaded"),
    }
    match snapshot.owner {
        Some(owner) => log::info!("Owner: {}", owner),
        None => log::info!("Owner: not loaded"),
    }
    match manager.countdown() {
        Countdown::NoLock => log::info!("No active time lock"),
        Countdown::Unlocked => log::info!("Unlocked - ready to withdraw"),
        Countdown::Locked(left) => log::info!(
            "Locked: {}d {}h {}m {}s remaining",
            left.days,
            left.hours,
            left.minutes,
            left.seconds
        ),
    }

    Ok(())
}
