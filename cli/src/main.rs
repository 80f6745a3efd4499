//! Booking engine command line
//!
//! Customer and operator front end over the reservation engine.
//!
//! ```sh
//! # Validate config without touching the database
//! booking-cli check
//!
//! # Book two lawn mowings and one weeding for alice
//! booking-cli --as alice book --service 1:2 --service 2 --date 2025-03-01 --time 10:30
//!
//! # Admin console listing, pending only
//! booking-cli --as ops list --status pending
//!
//! # Move a reservation
//! booking-cli --as alice reschedule 6f1c... --date 2025-03-02 --time 14:00
//! ```

use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use booking_engine::config::{AppConfig, CONFIG_ENV_VAR};
use booking_engine::domain::reservation::{past, upcoming};
use booking_engine::domain::{
    Cart, CustomerId, ReservationFilter, ReservationId, ReservationStatus, ServiceId,
};
use booking_engine::infrastructure::database::{init_database, run_migrations};
use booking_engine::runtime::{init_tracing, EngineHandle, EngineOptions};

/// Booking engine: reserve, reschedule and manage time-boxed services.
#[derive(Parser, Debug)]
#[command(
    name = "booking-cli",
    version,
    about = "Reservation and lifecycle engine for time-boxed services",
    long_about = "Books carts of services into reservations and drives them through \
                  their lifecycle.\n\n\
                  Default config: ~/.config/booking-engine/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, global = true, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Skip database migrations on startup.
    #[arg(long, global = true)]
    no_migrate: bool,

    /// Customer id to act as; admin role comes from `[auth] admins`.
    #[arg(long = "as", global = true, value_name = "CUSTOMER_ID")]
    acting_as: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the configuration file and exit.
    Check,
    /// Apply database migrations and exit.
    Migrate,
    /// List catalog services.
    Catalog,
    /// Check out a cart of services at one date and time.
    Book {
        /// Service id, optionally with quantity (`1` or `1:2`). Repeatable.
        #[arg(short, long = "service", required = true)]
        services: Vec<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Wall-clock time, `HH:MM`.
        #[arg(long)]
        time: Option<String>,
    },
    /// Insert a reservation for a customer (admin).
    Create {
        #[arg(long)]
        customer: String,
        #[arg(long)]
        service: String,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        time: Option<String>,
        #[arg(long, default_value = "pending")]
        status: ReservationStatus,
    },
    /// List reservations, latest start first.
    List {
        /// Only these statuses. Repeatable.
        #[arg(long)]
        status: Vec<ReservationStatus>,
        /// Only this customer (admins only for other customers).
        #[arg(long)]
        customer: Option<String>,
        /// Only active reservations that have not started.
        #[arg(long, conflicts_with = "past")]
        upcoming: bool,
        /// Only finished, withdrawn or elapsed reservations.
        #[arg(long)]
        past: bool,
    },
    /// Move a reservation to a new date and time.
    Reschedule {
        id: ReservationId,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        time: Option<String>,
    },
    /// Confirm a pending reservation (admin).
    Confirm { id: ReservationId },
    /// Cancel a reservation.
    Cancel { id: ReservationId },
    /// Mark a reservation as completed (admin).
    Complete { id: ReservationId },
    /// Permanently remove a reservation (admin).
    Delete { id: ReservationId },
}

fn parse_line(raw: &str) -> Result<(String, i64), String> {
    match raw.split_once(':') {
        Some((id, qty)) => qty
            .trim()
            .parse::<i64>()
            .map(|q| (id.trim().to_string(), q))
            .map_err(|_| format!("bad quantity in '{}'", raw)),
        None => Ok((raw.trim().to_string(), 1)),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────────
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(booking_engine::default_config_path);

    let loaded = AppConfig::load(&config_path);
    if let (Command::Check, Err(e)) = (&cli.command, &loaded) {
        eprintln!("Configuration is invalid: {}", e);
        eprintln!("   Config file : {}", config_path.display());
        return Err(e.to_string().into());
    }

    let mut config = match loaded {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", config_path.display(), e);
            eprintln!("Using default configuration.");
            AppConfig::default()
        }
    };

    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    init_tracing(&config);
    info!("Configuration: {}", config_path.display());

    // ── Commands that do not need the engine ──────────────────────
    match &cli.command {
        Command::Check => {
            println!("Configuration is valid");
            println!("   Config file : {}", config_path.display());
            println!("   Database    : {}", config.database.url);
            println!("   Catalog     : {} services", config.catalog.len());
            println!("   Admins      : {}", config.auth.admins.len());
            println!("   UTC offset  : {} min", config.booking.utc_offset_minutes);
            println!("   Log level   : {}", config.logging.level);
            return Ok(());
        }
        Command::Migrate => {
            let db = init_database(&config.database_config()).await?;
            run_migrations(&db).await?;
            println!("Migrations applied to {}", config.database.url);
            return Ok(());
        }
        _ => {}
    }

    // ── Start engine ───────────────────────────────────────────────
    let engine = EngineHandle::start(EngineOptions {
        config,
        auto_migrate: !cli.no_migrate,
        seed_catalog: true,
    })
    .await?;

    let outcome = run(&engine, cli.acting_as.as_deref(), cli.command).await;
    engine.close().await;

    if let Err(ref e) = outcome {
        error!("{}", e);
    }
    outcome
}

async fn run(
    engine: &EngineHandle,
    acting_as: Option<&str>,
    command: Command,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Command::Catalog = command {
        return print_json(&engine.repos.catalog().list().await?);
    }

    let Some(acting_as) = acting_as else {
        return Err("this command needs --as <CUSTOMER_ID>".into());
    };
    let actor = engine.actor_for(acting_as)?;

    match command {
        Command::Book {
            services,
            date,
            time,
        } => {
            let mut cart = Cart::new();
            for raw in &services {
                let (id, quantity) = parse_line(raw)?;
                match engine.repos.catalog().resolve_service(&id).await? {
                    Some(service) => {
                        let service_id = service.id.clone();
                        cart.add(service);
                        cart.set_quantity(&service_id, quantity);
                    }
                    None => warn!(service = %id, "Not in catalog, skipping"),
                }
            }

            let bill = cart.bill(engine.config.booking.service_charge);
            let result = engine
                .checkout
                .checkout(actor.id(), &cart, date, time.as_deref())
                .await?;
            result.apply_to(&mut cart);

            print_json(&serde_json::json!({
                "bill": bill,
                "result": result,
                "left_in_cart": cart.len(),
            }))?;
            if result.is_total_failure() {
                return Err("no booking was created".into());
            }
        }
        Command::Create {
            customer,
            service,
            quantity,
            date,
            time,
            status,
        } => {
            let r = engine
                .lifecycle
                .admin_create(
                    &actor,
                    &CustomerId::from(customer),
                    &ServiceId::from(service),
                    quantity,
                    date,
                    time.as_deref(),
                    status,
                )
                .await?;
            print_json(&r)?;
        }
        Command::List {
            status,
            customer,
            upcoming: only_upcoming,
            past: only_past,
        } => {
            let mut filter = match customer {
                Some(c) => ReservationFilter::for_customer(CustomerId::from(c)),
                None => ReservationFilter::all(),
            };
            for s in status {
                filter = filter.with_status(s);
            }
            let found = engine.lifecycle.list_reservations(&actor, filter).await?;
            let now = Utc::now();
            if only_upcoming {
                print_json(&upcoming(&found, now))?;
            } else if only_past {
                print_json(&past(&found, now))?;
            } else {
                print_json(&found)?;
            }
        }
        Command::Reschedule { id, date, time } => {
            let r = engine
                .lifecycle
                .reschedule(&actor, &id, date, time.as_deref())
                .await?;
            print_json(&r)?;
        }
        Command::Confirm { id } => print_json(&engine.lifecycle.confirm(&actor, &id).await?)?,
        Command::Cancel { id } => print_json(&engine.lifecycle.cancel(&actor, &id).await?)?,
        Command::Complete { id } => print_json(&engine.lifecycle.complete(&actor, &id).await?)?,
        Command::Delete { id } => {
            engine.lifecycle.delete(&actor, &id).await?;
            println!("Deleted {}", id);
        }
        Command::Check | Command::Migrate | Command::Catalog => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_service_lines() {
        assert_eq!(parse_line("1").unwrap(), ("1".to_string(), 1));
        assert_eq!(parse_line("2:3").unwrap(), ("2".to_string(), 3));
        assert!(parse_line("2:x").is_err());
    }

    #[test]
    fn parses_book_command() {
        let cli = Cli::try_parse_from([
            "booking-cli", "--as", "alice", "book", "-s", "1:2", "-s", "2", "--date", "2025-03-01",
            "--time", "10:30",
        ])
        .unwrap();
        assert_eq!(cli.acting_as.as_deref(), Some("alice"));
        match cli.command {
            Command::Book { services, date, time } => {
                assert_eq!(services, vec!["1:2", "2"]);
                assert_eq!(date, NaiveDate::from_ymd_opt(2025, 3, 1));
                assert_eq!(time.as_deref(), Some("10:30"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn parses_status_filters() {
        let cli = Cli::try_parse_from(["booking-cli", "list", "--status", "pending", "--status", "confirmed"]).unwrap();
        match cli.command {
            Command::List { status, .. } => {
                assert_eq!(status, vec![ReservationStatus::Pending, ReservationStatus::Confirmed])
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(Cli::try_parse_from(["booking-cli", "list", "--status", "upcoming"]).is_err());
    }
}
