// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow};
use biodex_app::{DialogState, UserId};
use biodex_store::{MemoryStore, RestStore, SpeciesStore};
use config::Config;
use log::info;
use runtime::StoreRuntime;
use std::env;
use std::path::PathBuf;

const DEMO_USER: &str = "demo-user";

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
            "load config {}; run `biodex --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    logging::init(&config.log_path()?, config.log_level()?)?;
    let user = resolve_user(&options, &config)?;

    let store: Box<dyn SpeciesStore> = if options.demo {
        Box::new(MemoryStore::new(biodex_testkit::demo_species(&user)))
    } else {
        let rest_options = config.rest_options().with_context(|| {
            format!(
                "invalid [store] config in {}",
                options.config_path.display()
            )
        })?;
        let rest = RestStore::new(rest_options).with_context(|| {
            format!(
                "invalid [store] config in {}; fix base_url/api_key/table/timeout values",
                options.config_path.display()
            )
        })?;
        info!(
            "using store {} (timeout {:?})",
            rest.base_url(),
            rest.timeout()
        );
        Box::new(rest)
    };

    if options.check_only {
        store.check().context("store check failed")?;
        println!("ok: config {} and store are usable", options.config_path.display());
        return Ok(());
    }

    info!("starting biodex for user {user} (demo: {})", options.demo);

    let mut dialog = DialogState::new(user);
    let mut runtime = StoreRuntime::new(store.as_ref());
    biodex_tui::run_app(&mut dialog, &mut runtime)?;
    info!("exiting after {} saved update(s)", runtime.saved().len());
    Ok(())
}

fn resolve_user(options: &CliOptions, config: &Config) -> Result<UserId> {
    if let Some(raw) = &options.user {
        return UserId::parse(raw).context("invalid --user value");
    }
    if options.demo {
        return config
            .user_id()
            .or_else(|_| UserId::parse(DEMO_USER));
    }
    config.user_id()
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    user: Option<String>,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        user: None,
        print_config_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--user" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--user requires a user id"))?;
                options.user = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
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
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("biodex -- edit the species records you authored");
    println!("  --config <path>          Use a specific config path");
    println!("  --user <id>              Act as this user instead of [user].id");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Launch against seeded in-memory demo data");
    println!("  --check                  Validate config and store access, then exit");
    println!("  --help                   Show this help");
}
