// SPDX-License-Identifier: GPL-3.0-only

//! Terminal front-end
//!
//! Drives the capture screen from a single-threaded tokio runtime: keys
//! become messages, tasks are spawned and their messages fed back, preview
//! frames stream in from the camera backend.

use crate::app::view;
use crate::app::{ActionSlot, CaptureScreen, Message, ScreenSettings, Task};
use crate::backends::Platform;
use crate::backends::camera::CameraBackend;
use crate::backends::camera::types::{
    BackendError, BackendResult, CameraFrame, Facing, FrameReceiver,
};
use crate::config::Config;
use crate::constants::ui as ui_consts;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// What a key press does
#[derive(Debug, Clone)]
pub enum KeyAction {
    Quit,
    Send(Message),
}

/// Map a key press to an action
pub fn key_action(key: KeyEvent) -> Option<KeyAction> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(KeyAction::Quit);
    }

    let message = match key.code {
        KeyCode::Char(' ') | KeyCode::Enter => Message::Capture,
        KeyCode::Char('c') => Message::ToggleFacing,
        KeyCode::Char('f') => Message::CycleFlash,
        KeyCode::Char('g') => Message::Action(ActionSlot::Gallery),
        KeyCode::Char('m') => Message::Action(ActionSlot::More),
        KeyCode::Char('r') => Message::Retake,
        KeyCode::Char('s') => Message::SaveToLibrary,
        KeyCode::Char('a') => Message::RequestCameraPermission,
        KeyCode::Char('h') => Message::ToggleHelp,
        KeyCode::Char('q') => return Some(KeyAction::Quit),
        _ => return None,
    };
    Some(KeyAction::Send(message))
}

/// Run the terminal camera
pub fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_screen(config))
}

async fn run_screen(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let platform = Platform::from_config(&config)?;
    let mut screen = CaptureScreen::new(platform, ScreenSettings::from(&config));

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut screen, config.mirror_preview).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    screen.platform().camera.stop_preview();
    result
}

/// Spawn a task; its message comes back through `sender`
fn dispatch(task: Task<Message>, sender: &UnboundedSender<Message>) {
    if let Some(future) = task.into_future() {
        let sender = sender.clone();
        tokio::spawn(async move {
            // The loop is gone when this fails; nothing left to update
            let _ = sender.send(future.await);
        });
    }
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    screen: &mut CaptureScreen,
    mirror_preview: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (sender, mut receiver) = unbounded_channel();
    let mut preview = PreviewStream::new(Arc::clone(&screen.platform().camera));

    dispatch(screen.mount(), &sender);

    loop {
        while let Ok(message) = receiver.try_recv() {
            dispatch(screen.update(message), &sender);
        }

        if let Err(e) = preview.sync(screen.wanted_preview()).await {
            dispatch(screen.update(Message::PreviewFailed(e)), &sender);
        }
        if let Some(frame) = preview.latest_frame() {
            dispatch(screen.update(Message::PreviewFrame(frame)), &sender);
        }
        dispatch(screen.update(Message::Tick(Instant::now())), &sender);

        terminal.draw(|f| view::draw(f, screen, mirror_preview))?;

        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                match key_action(key) {
                    Some(KeyAction::Quit) => {
                        info!("Quit requested");
                        return Ok(());
                    }
                    Some(KeyAction::Send(message)) => {
                        dispatch(screen.update(message), &sender);
                    }
                    None => {}
                }
            }
        }

        tokio::time::sleep(ui_consts::FRAME_INTERVAL).await;
    }
}

/// Keeps the backend's preview stream in line with what the screen wants
struct PreviewStream {
    camera: Arc<dyn CameraBackend>,
    active: Option<Facing>,
    receiver: Option<FrameReceiver>,
    pending: Option<(Facing, JoinHandle<BackendResult<FrameReceiver>>)>,
    stopping: Option<JoinHandle<()>>,
    /// Last facing that failed to start; not retried until the wish changes
    failed: Option<Facing>,
}

impl PreviewStream {
    fn new(camera: Arc<dyn CameraBackend>) -> Self {
        Self {
            camera,
            active: None,
            receiver: None,
            pending: None,
            stopping: None,
            failed: None,
        }
    }

    async fn sync(&mut self, wanted: Option<Facing>) -> Result<(), BackendError> {
        // One start or stop at a time: let it finish before changing course
        if self.stopping.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return Ok(());
        }
        self.stopping = None;

        if let Some((facing, handle)) = self.pending.take() {
            if !handle.is_finished() {
                self.pending = Some((facing, handle));
                return Ok(());
            }
            match handle.await {
                Ok(Ok(receiver)) => {
                    debug!(%facing, "Preview started");
                    self.active = Some(facing);
                    self.receiver = Some(receiver);
                }
                Ok(Err(e)) => {
                    self.failed = Some(facing);
                    return Err(e);
                }
                Err(e) => {
                    self.failed = Some(facing);
                    return Err(BackendError::Other(format!("Preview task failed: {}", e)));
                }
            }
        }

        if wanted == self.active || (wanted.is_some() && wanted == self.failed) {
            return Ok(());
        }

        self.receiver = None;
        self.failed = None;
        match wanted {
            Some(facing) => {
                self.active = None;
                let camera = Arc::clone(&self.camera);
                let handle = tokio::task::spawn_blocking(move || camera.start_preview(facing));
                self.pending = Some((facing, handle));
            }
            None => {
                if self.active.take().is_some() {
                    let camera = Arc::clone(&self.camera);
                    self.stopping = Some(tokio::task::spawn_blocking(move || camera.stop_preview()));
                }
            }
        }
        Ok(())
    }

    /// Newest frame received since the last call
    fn latest_frame(&mut self) -> Option<CameraFrame> {
        let receiver = self.receiver.as_mut()?;
        let mut latest = None;
        while let Ok(frame) = receiver.try_recv() {
            latest = Some(frame);
        }
        latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::{CameraBackendType, CameraDevice, CaptureRequest};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Camera whose preview never starts
    #[derive(Default)]
    struct DeadCamera {
        starts: AtomicUsize,
    }

    impl CameraBackend for DeadCamera {
        fn enumerate_cameras(&self) -> Vec<CameraDevice> {
            Vec::new()
        }

        fn start_preview(&self, facing: Facing) -> BackendResult<FrameReceiver> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            Err(BackendError::DeviceNotFound(format!("no {} camera", facing)))
        }

        fn stop_preview(&self) {}

        fn capture_photo(&self, _request: &CaptureRequest) -> BackendResult<CameraFrame> {
            Err(BackendError::NotAvailable("dead".into()))
        }

        fn backend_type(&self) -> CameraBackendType {
            CameraBackendType::Virtual
        }
    }

    /// Call `sync` until no start is pending; returns the reported errors
    async fn sync_until_idle(stream: &mut PreviewStream, wanted: Option<Facing>) -> usize {
        let mut errors = 0;
        for _ in 0..500 {
            if stream.sync(wanted).await.is_err() {
                errors += 1;
            }
            if stream.pending.is_none() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        errors
    }

    #[tokio::test]
    async fn failed_preview_is_reported_once_per_facing() {
        let camera = Arc::new(DeadCamera::default());
        let mut stream = PreviewStream::new(camera.clone());

        assert_eq!(sync_until_idle(&mut stream, Some(Facing::Back)).await, 1);
        assert_eq!(camera.starts.load(Ordering::SeqCst), 1);

        for _ in 0..5 {
            assert!(stream.sync(Some(Facing::Back)).await.is_ok());
        }
        assert_eq!(camera.starts.load(Ordering::SeqCst), 1, "Failed facing is not retried");
        assert!(stream.latest_frame().is_none());

        // A new facing gets a fresh attempt, and so does going back
        assert_eq!(sync_until_idle(&mut stream, Some(Facing::Front)).await, 1);
        assert_eq!(camera.starts.load(Ordering::SeqCst), 2);
        assert_eq!(sync_until_idle(&mut stream, Some(Facing::Back)).await, 1);
        assert_eq!(camera.starts.load(Ordering::SeqCst), 3);
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn keys_map_to_messages() {
        assert!(matches!(
            key_action(press(KeyCode::Char(' '))),
            Some(KeyAction::Send(Message::Capture))
        ));
        assert!(matches!(
            key_action(press(KeyCode::Char('f'))),
            Some(KeyAction::Send(Message::CycleFlash))
        ));
        assert!(matches!(
            key_action(press(KeyCode::Char('g'))),
            Some(KeyAction::Send(Message::Action(ActionSlot::Gallery)))
        ));
        assert!(key_action(press(KeyCode::Char('x'))).is_none());
    }

    #[test]
    fn ctrl_c_quits_but_c_flips() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(matches!(key_action(ctrl_c), Some(KeyAction::Quit)));
        assert!(matches!(
            key_action(press(KeyCode::Char('c'))),
            Some(KeyAction::Send(Message::ToggleFacing))
        ));
    }
}
