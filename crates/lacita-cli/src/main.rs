// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, bail};
use config::Config;
use lacita_app::{BookingFormInput, DashboardState, ListCommand, ListPhase, StatusFilter};
use lacita_db::{NewConsultation, Store};
use runtime::{DbRuntime, FixedIdentity, seed_demo_data};
use std::env;
use std::path::PathBuf;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

const DEMO_SEED_COUNT: usize = 40;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `lacita --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let db_path = if options.demo {
        PathBuf::from(":memory:")
    } else {
        config.db_path()?
    };
    if options.print_db_path {
        println!("{}", db_path.display());
        return Ok(());
    }

    let store = Store::open(&db_path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, set [storage].db_path or LACITA_DB_PATH",
            db_path.display()
        )
    })?;
    store.bootstrap()?;

    let now = OffsetDateTime::now_utc();
    let owner = config.owner_id();
    if options.demo {
        seed_demo_data(&store, &owner, DEMO_SEED_COUNT, now)?;
    }
    if options.check_only {
        return Ok(());
    }

    if let Some(raw) = &options.book {
        let input = parse_booking(raw)?;
        input.validate(now)?;
        let id = store.create_consultation(
            &owner,
            &NewConsultation {
                first_name: input.first_name,
                last_name: input.last_name,
                reason: input.reason,
                scheduled_at: input.scheduled_at,
            },
            now,
        )?;
        println!("booked consultation {id}");
    }

    let identity = FixedIdentity::new(owner);
    let runtime = DbRuntime::new(&store, &identity);
    let mut state = DashboardState::with_debounce(config.page_size(), config.search_debounce());

    runtime.drive(&mut state, ListCommand::Mounted, now)?;
    if let Some(search) = options.search {
        runtime.drive(&mut state, ListCommand::SearchInput(search), now)?;
    }
    if let Some(filter) = options.filter {
        runtime.drive(&mut state, ListCommand::FilterChanged(filter), now)?;
    }
    if options.fetch_all {
        while state.has_more && state.phase == ListPhase::Idle {
            runtime.drive(&mut state, ListCommand::LastRowVisible, now)?;
        }
    }

    print_dashboard(&state);
    Ok(())
}

fn print_dashboard(state: &DashboardState) {
    if let Some(counts) = state.counts {
        println!(
            "upcoming {} | pending {} | complete {} | incomplete {} | total {}",
            counts.upcoming, counts.pending, counts.complete, counts.incomplete, counts.total,
        );
    }

    if state.phase == ListPhase::Error {
        println!("consultations could not be loaded; rerun to retry");
        return;
    }
    if state.rows.is_empty() {
        println!("no consultations match");
        return;
    }

    let schedule_format = format_description!("[year]-[month]-[day] [hour]:[minute]");
    for row in &state.rows {
        let scheduled = row
            .scheduled_at
            .format(&schedule_format)
            .unwrap_or_else(|_| row.scheduled_at.to_string());
        println!(
            "{scheduled}  [{:<10}]  {} {}: {}",
            row.status.label(),
            row.first_name,
            row.last_name,
            row.reason,
        );
    }
    if state.has_more {
        println!("... more available (rerun with --all to page through)");
    }
}

fn parse_booking(raw: &str) -> Result<BookingFormInput> {
    let parts: Vec<&str> = raw.split('|').collect();
    let [first_name, last_name, reason, scheduled_raw] = parts.as_slice() else {
        bail!(
            "booking {raw:?} must have four |-separated fields: first|last|reason|scheduled-at"
        );
    };
    let scheduled_at = OffsetDateTime::parse(scheduled_raw, &Rfc3339)
        .with_context(|| format!("scheduled-at {scheduled_raw:?} must be RFC 3339"))?;
    Ok(BookingFormInput {
        first_name: (*first_name).to_owned(),
        last_name: (*last_name).to_owned(),
        reason: (*reason).to_owned(),
        scheduled_at,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_db_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
    search: Option<String>,
    filter: Option<StatusFilter>,
    fetch_all: bool,
    book: Option<String>,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_db_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
        search: None,
        filter: None,
        fetch_all: false,
        book: None,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-path" => {
                options.print_db_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--search" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--search requires a term"))?;
                options.search = Some(value.as_ref().to_owned());
            }
            "--filter" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--filter requires a status"))?;
                let filter = StatusFilter::parse(value.as_ref()).ok_or_else(|| {
                    anyhow::anyhow!(
                        "unknown status filter {:?}; use all, upcoming, pending, complete, or incomplete",
                        value.as_ref()
                    )
                })?;
                options.filter = Some(filter);
            }
            "--all" => {
                options.fetch_all = true;
            }
            "--book" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow::anyhow!("--book requires first|last|reason|scheduled-at")
                })?;
                options.book = Some(value.as_ref().to_owned());
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("lacita");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-path             Print resolved database path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Run against seeded in-memory data");
    println!("  --check                  Validate config + DB and exit");
    println!("  --search <term>          Filter reasons by substring");
    println!("  --filter <status>        all, upcoming, pending, complete, incomplete");
    println!("  --all                    Page through every consultation");
    println!("  --book <fields>          Book first|last|reason|scheduled-at (RFC 3339)");
    println!("  --help                   Show this help");
}
