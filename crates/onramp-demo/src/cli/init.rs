/*
[INPUT]:  Interactive user input via CLI
[OUTPUT]: Generated YAML configuration file
[POS]:    CLI initialization layer
[UPDATE]: When DemoConfig schema changes
*/

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};
use rust_decimal::Decimal;
use std::path::PathBuf;

use onramp_adapter::ObserverMode;
use onramp_adapter::auth::credentials::{KEY_ID_ENV, KEY_SECRET_ENV};
use onramp_demo::config::{CheckoutConfig, DemoConfig, StatusConfig, WalletConfig};

pub fn run_init(output: PathBuf) -> Result<()> {
    println!("{}", style("Welcome to Onramp Demo Init").bold().cyan());
    println!(
        "{}",
        style("This will guide you through creating a new demo configuration.").dim()
    );

    let theme = ColorfulTheme::default();

    println!("\n{}", style("--- Wallet ---").bold());
    let address: String = Input::with_theme(&theme)
        .with_prompt("Destination wallet address")
        .interact_text()?;

    let blockchains: String = Input::with_theme(&theme)
        .with_prompt("Blockchains (comma separated)")
        .default("base".to_string())
        .interact_text()?;

    let assets: String = Input::with_theme(&theme)
        .with_prompt("Assets (comma separated, empty for all)")
        .default("USDC".to_string())
        .allow_empty(true)
        .interact_text()?;

    println!("\n{}", style("--- Checkout ---").bold());
    let mut checkout = CheckoutConfig::default();
    checkout.presets.default_asset = split_list(&assets).into_iter().next();
    checkout.presets.default_network = split_list(&blockchains).into_iter().next();

    let fiat_amount: String = Input::with_theme(&theme)
        .with_prompt("Preset fiat amount (empty for none)")
        .allow_empty(true)
        .validate_with(|input: &String| -> std::result::Result<(), String> {
            if input.trim().is_empty() || input.trim().parse::<Decimal>().is_ok() {
                Ok(())
            } else {
                Err("not a decimal amount".to_string())
            }
        })
        .interact_text()?;
    checkout.presets.preset_fiat_amount = fiat_amount.trim().parse::<Decimal>().ok();

    let currency: String = Input::with_theme(&theme)
        .with_prompt("Fiat currency")
        .default("USD".to_string())
        .interact_text()?;
    checkout.presets.fiat_currency = Some(currency);

    println!("\n{}", style("--- Status ---").bold());
    let modes = ["polling", "webhook"];
    let mode_selection = Select::with_theme(&theme)
        .with_prompt("Status observation mode")
        .items(&modes)
        .default(0)
        .interact()?;
    let mut status = StatusConfig {
        mode: if mode_selection == 0 {
            ObserverMode::Polling
        } else {
            ObserverMode::Webhook
        },
        ..StatusConfig::default()
    };

    if status.mode == ObserverMode::Polling {
        status.max_attempts = Input::with_theme(&theme)
            .with_prompt("Max poll attempts")
            .default(status.max_attempts)
            .interact_text()?;
        status.interval_secs = Input::with_theme(&theme)
            .with_prompt("Poll interval (seconds)")
            .default(status.interval_secs)
            .interact_text()?;
    }

    let config = DemoConfig {
        wallet: WalletConfig {
            address,
            blockchains: split_list(&blockchains),
            assets: split_list(&assets),
        },
        checkout,
        status,
        ..DemoConfig::default()
    };
    config.validate_checkout().context("generated configuration is invalid")?;

    if output.exists() {
        let overwrite = Confirm::with_theme(&theme)
            .with_prompt(format!("{} exists. Overwrite?", output.display()))
            .default(false)
            .interact()?;
        if !overwrite {
            println!("{}", style("Aborted; nothing written.").yellow());
            return Ok(());
        }
    }

    let yaml = serde_yaml::to_string(&config).context("failed to serialize config to YAML")?;

    std::fs::write(&output, yaml)
        .context(format!("failed to write config to {}", output.display()))?;

    println!("\n{}", style("SUCCESS!").bold().green());
    println!(
        "Configuration written to: {}",
        style(output.display()).cyan()
    );
    println!(
        "Set {} and {} in your environment (or .env) before running.",
        style(KEY_ID_ENV).yellow(),
        style(KEY_SECRET_ENV).yellow()
    );

    Ok(())
}

fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
