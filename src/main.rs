use anyhow::Context;
use users_contract::configuration::get_configuration;
use users_contract::scenario::UsersScenario;
use users_contract::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("users-contract".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let configuration = get_configuration().context("Failed to read configuration.")?;
    let scenario =
        UsersScenario::build(configuration).context("Failed to build the users API client.")?;

    let report = scenario.run().await;
    eprintln!("{}", report);
    if !report.is_success() {
        anyhow::bail!(
            "{} of {} cases failed",
            report.failures().count(),
            report.outcomes().len()
        );
    }
    Ok(())
}
