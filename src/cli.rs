// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Recording a clip through the capture session without the screen
//! - Inspecting the permission gate
//! - Inspecting the configuration

use inapp_camera::permissions::{
    DevicePermissions, PermissionProvider, PlatformProfile, RequiredPermissions,
};
use inapp_camera::{
    Capabilities, CaptureController, Config, Lens, Message, NotificationLevel, SessionChannels,
    SessionSettings, SessionState,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// How long to wait for the camera to come up
const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// How long to wait for a stopped recording to be written
const FINALIZE_TIMEOUT: Duration = Duration::from_secs(30);

/// Record a clip of `duration` seconds with the configured (or given) lens
pub fn record(
    config: Config,
    lens: Option<Lens>,
    duration: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    runtime.block_on(record_session(config, lens, duration, stop_flag))
}

async fn record_session(
    config: Config,
    lens: Option<Lens>,
    duration: u64,
    stop_flag: Arc<AtomicBool>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = SessionSettings::from_config(&config);
    if let Some(lens) = lens {
        settings.initial_lens = lens;
    }
    let (mut session, mut channels) =
        CaptureController::new(Capabilities::desktop(&config), settings);

    session.update(Message::Foreground);
    pump_until(&mut session, &mut channels, STARTUP_TIMEOUT, |s| {
        s.state() == SessionState::Previewing
            || (s.state() == SessionState::Idle && s.controls_enabled())
            || s.view(Instant::now()).denial_notice.is_some()
    })
    .await;
    if session.state() != SessionState::Previewing {
        return Err("Camera did not start".into());
    }

    println!("Using {} camera", session.lens());
    println!("Duration: {} seconds", duration);

    session.update(Message::ToggleRecording);
    drain(&mut session, &mut channels);
    if session.state() != SessionState::Recording {
        return Err("Recording did not start".into());
    }

    println!();
    println!("Recording... (press Ctrl+C to stop early)");

    // Wait for duration or Ctrl+C
    let start = Instant::now();
    let target_duration = Duration::from_secs(duration);
    while start.elapsed() < target_duration && session.state() == SessionState::Recording {
        if stop_flag.load(Ordering::SeqCst) {
            println!();
            println!("Stopping early...");
            break;
        }

        let elapsed = start.elapsed().as_secs();
        print!("\rRecording: {:02}:{:02}", elapsed / 60, elapsed % 60);
        std::io::Write::flush(&mut std::io::stdout())?;

        tokio::time::sleep(Duration::from_millis(100)).await;
        drain(&mut session, &mut channels);
    }
    println!();

    if session.state() == SessionState::Recording {
        session.update(Message::ToggleRecording);
    }
    pump_until(&mut session, &mut channels, FINALIZE_TIMEOUT, |s| {
        !s.is_finalizing()
    })
    .await;

    match session.artifact() {
        Some(artifact) => {
            println!("Video saved: {}", artifact.path.display());
            Ok(())
        }
        None => Err("Recording was not saved".into()),
    }
}

/// Print the required permission set and what is granted
pub fn show_permissions(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let profile = PlatformProfile::new(config.platform_level);
    let required = RequiredPermissions::resolve(profile);
    let status = DevicePermissions::from_config(config).check(&required);

    println!("Platform level: {}", profile.level);
    println!("Required permissions:");
    for permission in required.iter() {
        let mark = if status.is_granted(permission) {
            "granted"
        } else {
            "denied"
        };
        println!("  {:<12} {}", permission.display_name(), mark);
    }
    println!();
    if status.satisfies(&required) {
        println!("All required permissions are granted.");
    } else {
        println!("Recording is unavailable until every permission is granted.");
    }
    Ok(())
}

/// Print the active configuration, optionally writing it out
pub fn show_config(config: &Config, write: bool) -> Result<(), Box<dyn std::error::Error>> {
    match Config::default_path() {
        Some(path) => println!("Configuration file: {}", path.display()),
        None => println!("Configuration file: (no configuration directory)"),
    }
    println!("Recordings: {}", config.output_root().display());
    println!();
    println!("{}", serde_json::to_string_pretty(config)?);

    if write {
        config.save()?;
        println!();
        println!("Configuration written.");
    }
    Ok(())
}

/// Feed queued messages into the session and print notifications
fn drain(session: &mut CaptureController, channels: &mut SessionChannels) {
    while let Ok(message) = channels.messages.try_recv() {
        session.update(message);
    }
    print_notifications(channels);
}

fn print_notifications(channels: &mut SessionChannels) {
    while let Ok(notification) = channels.notifications.try_recv() {
        match notification.level {
            NotificationLevel::Info => println!("{}", notification.message),
            NotificationLevel::Error => eprintln!("Error: {}", notification.message),
        }
    }
}

/// Process messages until `done` holds or `timeout` elapses
async fn pump_until(
    session: &mut CaptureController,
    channels: &mut SessionChannels,
    timeout: Duration,
    done: impl Fn(&CaptureController) -> bool,
) {
    let deadline = tokio::time::Instant::now() + timeout;
    print_notifications(channels);
    while !done(session) {
        match tokio::time::timeout_at(deadline, channels.messages.recv()).await {
            Ok(Some(message)) => session.update(message),
            Ok(None) | Err(_) => break,
        }
        print_notifications(channels);
    }
}
