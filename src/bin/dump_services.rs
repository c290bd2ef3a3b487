//! Dump upcoming services from Elvanto for analysis.
//!
//! Usage: cargo run --bin dump_services [-- --days 14 --location "Main Campus"]

use anyhow::Context;
use elvanto_ext::config::Config;
use elvanto_ext::elvanto::{Connection, PlanItem, ServiceQuery};
use elvanto_ext::filters::LocationFilter;
use tracing_subscriber::EnvFilter;

fn arg_value(name: &str) -> Option<String> {
    std::env::args()
        .position(|a| a == name)
        .and_then(|i| std::env::args().nth(i + 1))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!(app = config.app_name(), version = config.app_version(), "Starting");
    let days: i64 = arg_value("--days")
        .and_then(|s| s.parse().ok())
        .unwrap_or(config.days_ahead);
    let location = arg_value("--location").map_or(LocationFilter::Any, LocationFilter::Name);

    let mut conn = Connection::from_config(&config).context("Failed to connect")?;
    let services = conn
        .services_upcoming(days, &ServiceQuery::at(location))
        .await
        .context("Failed to fetch services")?;

    println!("=== Services ({}) ===\n", services.len());
    for service in &services {
        let kind = service.service_type.as_ref().map_or("-", |t| t.name.as_str());
        println!("--- {service} | {kind} | {} ---", service.location_name());

        for (pos, item) in service.plan.iter().flatten().enumerate() {
            let detail = match item {
                PlanItem::Header { .. } => String::new(),
                PlanItem::Item(item) => format!(" ({})", item.duration),
                PlanItem::Song { item, song } => format!(
                    " ({}) [song: \"{}\", artist: {}, ccli: {}]",
                    item.duration, song.title, song.artist, song.ccli_number
                ),
            };
            println!("  {:>2}. {item}{detail}", pos + 1);
        }

        if let Some(roster) = &service.volunteers {
            for position in &roster.positions {
                let names: Vec<_> = position.volunteers.iter().map(ToString::to_string).collect();
                println!(
                    "  [{} / {}] {}: {}",
                    position.department_name,
                    position.sub_department_name,
                    position.position_name,
                    names.join(", ")
                );
            }
        }
        println!();
    }

    Ok(())
}
