pub mod action_catalog;
pub mod avantis;
pub mod command;
pub mod console_control;
pub mod encoder;
pub mod error;
pub mod midi_message;
pub mod settings;
pub mod transport;
pub mod user_session;

use std::sync::Arc;

use env_logger::Env;

use crate::{
    avantis::profile::load_profiles, console_control::ConsoleControl, encoder::CommandEncoder,
    error::AppError, settings::Settings,
};

const DEFAULT_SETTINGS: &str = "config/settings.yaml";

fn load_encoder(settings: &Settings) -> Result<CommandEncoder, AppError> {
    let mut profiles = load_profiles(&settings.profiles_dir);
    let Some(profile) = profiles.remove(&settings.console.profile) else {
        return Err(AppError::config(format!(
            "profile '{}' not found in {}",
            settings.console.profile, settings.profiles_dir
        )));
    };
    log::info!(
        "Console profile {}: {} scenes, {} fader levels",
        profile.model,
        profile.scene_count,
        profile.fader_levels.len()
    );
    return CommandEncoder::new(
        Arc::new(profile),
        settings.midi_base(),
        settings.assign_policy()?,
    );
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    log::info!("Avantis control started");

    let settings_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SETTINGS.to_string());
    let settings = match Settings::load(&settings_path) {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Failed to load settings from {}: {}", settings_path, e);
            std::process::exit(1);
        }
    };
    let encoder = match load_encoder(&settings) {
        Ok(encoder) => Arc::new(encoder),
        Err(e) => {
            log::error!("Failed to set up the command encoder: {}", e);
            std::process::exit(1);
        }
    };
    log::info!(
        "MIDI channel {}, assign offsets {:?}",
        settings.console.midi_channel,
        encoder.assign_policy()
    );

    // Console link
    let (burst_tx, _transport_handle) = transport::start(settings.console_address());

    // Controller
    let mut console_control = ConsoleControl::new(encoder, burst_tx);

    // User sessions
    let (mut command_rx, _session_handle) = match user_session::start(&settings.listen).await {
        Ok(started) => started,
        Err(e) => {
            log::error!("Failed to listen on {}: {}", settings.listen, e);
            std::process::exit(1);
        }
    };

    loop {
        tokio::select! {
        Some(user_command) = command_rx.recv() => {
            console_control.handle_command(user_command).await;
        }
        _ = tokio::signal::ctrl_c() => {
            log::info!("Shutting down");
            break;
        }
        }
    }
}
