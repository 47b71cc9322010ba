//! Setu - Roomba to MQTT bridge daemon
//!
//! ## Usage
//!
//! - `setu [<config>]` / `setu --config <config>`: run the bridge
//! - `setu replay [<movement.json>]`: print a dead-reckoned trace of a
//!   recorded movement log

use setu::bus::{command_queue, MqttBus};
use setu::config::AppConfig;
use setu::devices::Create2;
use setu::recorder::{read_samples, MovementLog};
use setu::replay::{trace, DEFAULT_SCALE};
use setu::session::{Session, SessionOptions};
use setu::transport::SerialTransport;
use setu::{Error, Result};
use std::env;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const DEFAULT_CONFIG_PATH: &str = "/etc/setu.toml";
const DEFAULT_MOVEMENT_PATH: &str = "movement.json";

/// Parse config path from command line arguments.
///
/// Supports:
/// - `setu <path>` (positional)
/// - `setu --config <path>` (flag-based)
/// - `setu -c <path>` (short flag)
///
/// Defaults to `/etc/setu.toml` if not specified.
fn parse_config_path(args: &[String]) -> String {
    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    DEFAULT_CONFIG_PATH.to_string()
}

/// Load the config file; a missing default file means built-in defaults
fn load_config(path: &str) -> Result<AppConfig> {
    if path == DEFAULT_CONFIG_PATH && !Path::new(path).exists() {
        return Ok(AppConfig::default());
    }
    AppConfig::from_file(path)
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.get(1).map(String::as_str) == Some("replay") {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        let path = args.get(2).map(String::as_str).unwrap_or(DEFAULT_MOVEMENT_PATH);
        return replay(path);
    }

    let config_path = parse_config_path(&args);
    let config = load_config(&config_path)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("Setu v{} starting...", env!("CARGO_PKG_VERSION"));
    log::info!("Using config: {}", config_path);

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);

    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    // Bus thread only gets the sending half of the queue
    let (commands_tx, commands_rx) = command_queue();
    let (publisher, _mqtt_handle) = MqttBus::start(&config.mqtt, commands_tx, Arc::clone(&running))?;

    let transport = SerialTransport::new(
        &config.serial.port,
        config.serial.baud_rate,
        config.serial.read_timeout(),
    );
    let device = Create2::new(transport, config.poll.settle());

    let mut session = Session::new(
        device,
        publisher,
        commands_rx,
        SessionOptions::from_config(&config),
    )?;

    if config.recorder.enabled {
        let movement_log = MovementLog::load_or_empty(&config.recorder.path);
        session = session.with_movement_log(movement_log);
    }

    session.run(&running);

    if let Err(e) = session.publisher_mut().disconnect() {
        log::warn!("MQTT disconnect failed: {}", e);
    }

    log::info!("Setu stopped");
    Ok(())
}

fn replay(path: &str) -> Result<()> {
    let samples = read_samples(Path::new(path))?;
    log::info!("Replaying {} samples from {}", samples.len(), path);

    println!("{:>10} {:>10} {:>8}  event", "x", "y", "heading");
    for point in trace(&samples, DEFAULT_SCALE) {
        println!("{}", point);
    }
    Ok(())
}
