// SPDX-License-Identifier: GPL-3.0-only

//! Terminal presentation layer
//!
//! Renders the display region (live preview or the reviewed clip) with
//! Unicode half-block characters, plus a controls bar and a status line.
//! Keys map onto the session's three controls and the tap on playback.

use crate::app::{
    Capabilities, CaptureController, DisplayRegion, Message, Notification, NotificationLevel,
    SessionChannels, SessionSettings, SessionState, ViewState,
};
use crate::backends::camera::{FrameReceiver, Lens, PreviewFrame};
use crate::config::Config;
use crate::constants::timing::NOTIFICATION_DISPLAY;
use crossterm::{
    event::{
        self, DisableFocusChange, EnableFocusChange, Event, KeyCode, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};
use std::io::{self, stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Run the terminal camera screen until the user quits
pub fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    let _guard = runtime.enter();

    let (session, channels) = CaptureController::new(
        Capabilities::desktop(&config),
        SessionSettings::from_config(&config),
    );

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, session, channels);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableFocusChange, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut session: CaptureController,
    mut channels: SessionChannels,
) -> Result<(), Box<dyn std::error::Error>> {
    let camera_frames = session.camera_frames();
    let playback_frames = session.playback_frames();
    let mut toast: Option<(Notification, Instant)> = None;

    session.update(Message::Foreground);

    loop {
        while let Ok(message) = channels.messages.try_recv() {
            session.update(message);
        }
        while let Ok(notification) = channels.notifications.try_recv() {
            toast = Some((notification, Instant::now()));
        }
        if toast
            .as_ref()
            .is_some_and(|(_, shown)| shown.elapsed() > NOTIFICATION_DISPLAY)
        {
            toast = None;
        }

        let now = Instant::now();
        let view = session.view(now);
        let frame = current_frame(&view, &camera_frames, &playback_frames);

        terminal.draw(|f| {
            let area = f.area();
            let display_area = Rect {
                height: area.height.saturating_sub(2),
                ..area
            };
            let controls_area = Rect {
                y: area.y + area.height.saturating_sub(2),
                height: 1.min(area.height),
                ..area
            };
            let status_area = Rect {
                y: area.y + area.height.saturating_sub(1),
                height: 1.min(area.height),
                ..area
            };

            f.render_widget(
                FrameWidget {
                    frame: frame.as_deref(),
                    placeholder: placeholder(&view),
                },
                display_area,
            );
            f.render_widget(ControlsBar { view: &view }, controls_area);
            f.render_widget(
                StatusBar {
                    view: &view,
                    toast: toast.as_ref().map(|(n, _)| n),
                },
                status_area,
            );
        })?;

        if !event::poll(Duration::from_millis(16))? {
            continue;
        }

        match event::read()? {
            Event::FocusGained => session.update(Message::Foreground),
            Event::FocusLost => session.update(Message::Background),
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    break;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Char('r') | KeyCode::Enter if view.record_visible => {
                        session.update(Message::ToggleRecording)
                    }
                    KeyCode::Char('s') if view.switch_visible => {
                        session.update(Message::SwitchLens)
                    }
                    KeyCode::Char('d') if view.discard_visible => {
                        session.update(Message::DiscardRecording)
                    }
                    KeyCode::Char(' ') | KeyCode::Char('p')
                        if view.display == DisplayRegion::Playback =>
                    {
                        session.update(Message::TogglePlayback)
                    }
                    KeyCode::Char('g') => session.update(Message::RequestPermissions),
                    KeyCode::Char('x') => session.update(Message::DismissNotice),
                    _ => {}
                }
            }
            _ => {}
        }
    }

    info!("Leaving terminal session");
    Ok(())
}

fn current_frame(
    view: &ViewState,
    camera: &FrameReceiver,
    playback: &FrameReceiver,
) -> Option<Arc<PreviewFrame>> {
    match view.display {
        DisplayRegion::Preview => camera.borrow().clone(),
        DisplayRegion::Playback => playback.borrow().clone(),
        DisplayRegion::Blank => None,
    }
}

fn placeholder(view: &ViewState) -> &'static str {
    match view.display {
        DisplayRegion::Blank if view.denial_notice.is_some() => "Camera unavailable",
        DisplayRegion::Blank => "Waiting for camera...",
        DisplayRegion::Preview => "Waiting for camera...",
        DisplayRegion::Playback => "Loading video...",
    }
}

/// Renders an RGB frame using half-block characters
struct FrameWidget<'a> {
    frame: Option<&'a PreviewFrame>,
    placeholder: &'static str,
}

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let frame = match self.frame {
            Some(frame) if frame.width > 0 && frame.height > 0 => frame,
            _ => {
                let msg = self.placeholder;
                let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
                let y = area.y + area.height / 2;
                if y < area.y + area.height && x < area.x + area.width {
                    buf.set_string(x, y, msg, Style::default());
                }
                return;
            }
        };

        // Each cell shows two vertical pixels
        let frame_aspect = frame.width as f64 / frame.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height as f64) * 2.0;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            let h = term_height;
            ((h * frame_aspect) as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            (w as u16, (w / frame_aspect / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;
        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height as f64 * 2.0);

        for ty in 0..display_height {
            for tx in 0..display_width {
                let src_x = (tx as f64 * x_scale) as u32;
                let src_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let (r, g, b) = frame.rgb_at(src_x, src_top);
                let top = Color::Rgb(r, g, b);
                let (r, g, b) = frame.rgb_at(src_x, src_bottom);
                let bottom = Color::Rgb(r, g, b);

                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }
    }
}

/// Record / switch / discard controls
struct ControlsBar<'a> {
    view: &'a ViewState,
}

impl ControlsBar<'_> {
    fn record_style(&self) -> Style {
        // Pulse by dimming the red towards the bar background
        let level = (self.view.record_opacity.clamp(0.0, 1.0) * 255.0) as u8;
        let style = Style::default().bg(Color::Black);
        if self.view.recording {
            style.fg(Color::Rgb(level, 0, 0)).add_modifier(Modifier::BOLD)
        } else {
            style.fg(Color::White)
        }
    }

    fn switch_label(&self) -> String {
        // Edge-on around 90 degrees
        let angle = self.view.switch_rotation.rem_euclid(180.0);
        if (45.0..135.0).contains(&angle) {
            return "[s] |".to_string();
        }
        let icon = match self.view.switch_icon {
            Lens::Front => "front",
            Lens::Back => "back",
        };
        format!("[s] Camera: {}", icon)
    }
}

impl Widget for ControlsBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        fill(area, buf, Color::Black);

        let mut x = area.x;
        let mut put = |text: &str, style: Style, buf: &mut Buffer| {
            if x < area.x + area.width {
                buf.set_stringn(x, area.y, text, (area.x + area.width - x) as usize, style);
                x = x.saturating_add(text.chars().count() as u16 + 3);
            }
        };

        let plain = Style::default().fg(Color::White).bg(Color::Black);
        if self.view.record_visible {
            let label = if self.view.recording {
                "[r] ● Stop"
            } else {
                "[r] ● Record"
            };
            put(label, self.record_style(), buf);
        }
        if self.view.switch_visible {
            put(&self.switch_label(), plain, buf);
        }
        if self.view.discard_visible {
            put("[d] Discard", plain, buf);
        }
        if self.view.display == DisplayRegion::Playback {
            let label = if self.view.playback_paused {
                "[space] Play"
            } else {
                "[space] Pause"
            };
            put(label, plain, buf);
        }
        put("[q] Quit", plain, buf);
    }
}

/// Session state plus the latest notification or the denial notice
struct StatusBar<'a> {
    view: &'a ViewState,
    toast: Option<&'a Notification>,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        fill(area, buf, Color::DarkGray);

        let mut text = format!("{} | {} camera", self.view.state.display_name(), self.view.lens);
        if self.view.saving {
            text.push_str(" | saving...");
        }

        let mut style = Style::default().fg(Color::White).bg(Color::DarkGray);
        if let Some(notice) = &self.view.denial_notice {
            text = format!("{} ('g' retry, 'x' dismiss)", notice);
            style = style.fg(Color::LightRed);
        } else if let Some(toast) = self.toast {
            text = format!("{} | {}", text, toast.message);
            if toast.level == NotificationLevel::Error {
                style = style.fg(Color::LightRed);
            }
        } else if self.view.state == SessionState::Idle && !self.view.record_visible {
            text.push_str(" | waiting for permissions ('g' to retry)");
        }

        buf.set_stringn(area.x, area.y, &text, area.width as usize, style);
    }
}

fn fill(area: Rect, buf: &mut Buffer, color: Color) {
    for x in area.x..area.x + area.width {
        if let Some(cell) = buf.cell_mut((x, area.y)) {
            cell.set_char(' ');
            cell.set_bg(color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> ViewState {
        ViewState {
            state: SessionState::Previewing,
            lens: Lens::Front,
            record_visible: true,
            switch_visible: true,
            discard_visible: false,
            recording: false,
            record_opacity: 1.0,
            switch_rotation: 0.0,
            switch_icon: Lens::Front,
            display: DisplayRegion::Preview,
            playback_paused: false,
            denial_notice: None,
            saving: false,
        }
    }

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn hidden_controls_are_not_drawn() {
        let mut view = view();
        view.record_visible = false;
        view.switch_visible = false;

        let area = Rect::new(0, 0, 60, 1);
        let mut buf = Buffer::empty(area);
        ControlsBar { view: &view }.render(area, &mut buf);

        let text = row(&buf, 0);
        assert!(!text.contains("Record"));
        assert!(!text.contains("Camera"));
        assert!(text.contains("Quit"));
    }

    #[test]
    fn switch_button_is_edge_on_mid_flip() {
        let mut view = view();
        view.switch_rotation = 90.0;
        assert_eq!(ControlsBar { view: &view }.switch_label(), "[s] |");
    }

    #[test]
    fn denial_notice_takes_over_status_line() {
        let mut view = view();
        view.state = SessionState::Idle;
        view.denial_notice = Some("Permission request denied (Camera)".into());

        let area = Rect::new(0, 0, 80, 1);
        let mut buf = Buffer::empty(area);
        StatusBar {
            view: &view,
            toast: None,
        }
        .render(area, &mut buf);

        assert!(row(&buf, 0).starts_with("Permission request denied (Camera)"));
    }
}
