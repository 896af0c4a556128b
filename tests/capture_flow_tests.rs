// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the capture screen flow

use chrono::{Local, NaiveDate};
use polaroid::app::view::draw;
use polaroid::app::{ActionSlot, CaptureScreen, Message, ScreenSettings, Stage, ViewKind, caption_for};
use polaroid::backends::Platform;
use polaroid::backends::camera::{
    BackendError, BackendResult, CameraBackend, CameraBackendType, CameraDevice, CameraFrame,
    CaptureRequest, Facing, FrameReceiver, SensorRotation,
};
use polaroid::backends::library::{MediaLibrary, SavedAsset};
use polaroid::backends::permissions::{PermissionProvider, PermissionState, StaticPermissions};
use polaroid::errors::{PermissionError, SaveError};
use polaroid::flash::FlashMode;
use polaroid::pipelines::photo::CapturedPhoto;
use proptest::prelude::*;
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Camera that hands out a small gray frame, or fails every capture
#[derive(Default)]
struct FakeCamera {
    fail: bool,
    captures: AtomicUsize,
    last_request: Mutex<Option<CaptureRequest>>,
}

impl CameraBackend for FakeCamera {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        vec![CameraDevice {
            name: "Fake camera".to_string(),
            path: "fake:0".to_string(),
            driver: None,
            facing: None,
            rotation: SensorRotation::None,
        }]
    }

    fn start_preview(&self, _facing: Facing) -> BackendResult<FrameReceiver> {
        Err(BackendError::NotAvailable("no preview in tests".into()))
    }

    fn stop_preview(&self) {}

    fn capture_photo(&self, request: &CaptureRequest) -> BackendResult<CameraFrame> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(*request);
        if self.fail {
            return Err(BackendError::Timeout("no frame".into()));
        }
        Ok(CameraFrame::from_rgb(8, 6, vec![128; 8 * 6 * 3]))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Virtual
    }
}

/// Library that records saved photos instead of writing them
#[derive(Default)]
struct FakeLibrary {
    fail: bool,
    saved: Mutex<Vec<uuid::Uuid>>,
}

impl MediaLibrary for FakeLibrary {
    fn save_asset(&self, photo: &CapturedPhoto) -> Result<SavedAsset, SaveError> {
        if self.fail {
            return Err(SaveError::WriteFailed("disk full".into()));
        }
        self.saved.lock().unwrap().push(photo.id());
        Ok(SavedAsset {
            path: PathBuf::from(format!("/photos/{}.jpg", photo.id())),
        })
    }
}

/// Camera probe that always errors; library access is granted
struct BrokenCameraProbe;

impl PermissionProvider for BrokenCameraProbe {
    fn camera_status(&self) -> Result<PermissionState, PermissionError> {
        Err(PermissionError::ProbeFailed("no device directory".into()))
    }

    fn request_camera(&self) -> Result<PermissionState, PermissionError> {
        Err(PermissionError::ProbeFailed("no device directory".into()))
    }

    fn request_library(&self) -> Result<PermissionState, PermissionError> {
        Ok(PermissionState::Granted)
    }
}

/// Camera access that the test can grant later, as a user would in settings
struct SwitchablePermissions {
    camera: Arc<Mutex<PermissionState>>,
    camera_requests: Arc<AtomicUsize>,
}

impl PermissionProvider for SwitchablePermissions {
    fn camera_status(&self) -> Result<PermissionState, PermissionError> {
        Ok(*self.camera.lock().unwrap())
    }

    fn request_camera(&self) -> Result<PermissionState, PermissionError> {
        self.camera_requests.fetch_add(1, Ordering::SeqCst);
        Ok(*self.camera.lock().unwrap())
    }

    fn request_library(&self) -> Result<PermissionState, PermissionError> {
        Ok(PermissionState::Granted)
    }
}

struct Harness {
    screen: CaptureScreen,
    camera: Arc<FakeCamera>,
    library: Arc<FakeLibrary>,
}

fn harness(
    camera: FakeCamera,
    library: FakeLibrary,
    permissions: impl PermissionProvider + 'static,
) -> Harness {
    let camera = Arc::new(camera);
    let library = Arc::new(library);
    let platform = Platform {
        camera: camera.clone(),
        permissions: Arc::new(permissions),
        library: library.clone(),
    };
    Harness {
        screen: CaptureScreen::new(platform, ScreenSettings::default()),
        camera,
        library,
    }
}

fn granted() -> Harness {
    harness(FakeCamera::default(), FakeLibrary::default(), StaticPermissions::granted())
}

async fn mounted(mut h: Harness) -> Harness {
    h.screen.perform(Message::RequestPermissions).await;
    h
}

fn render(screen: &CaptureScreen) -> String {
    let mut terminal = Terminal::new(TestBackend::new(80, 40)).unwrap();
    terminal.draw(|frame| draw(frame, screen, true)).unwrap();
    terminal
        .backend()
        .buffer()
        .content()
        .iter()
        .map(|cell| cell.symbol())
        .collect()
}

#[test]
fn test_caption_format() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
    assert_eq!(caption_for(date), "2024/03/05", "Caption must be zero padded");

    let date = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
    assert_eq!(caption_for(date), "1999/12/31");
}

#[test]
fn test_initial_state() {
    let h = granted();
    assert_eq!(h.screen.view_kind(), ViewKind::PermissionPending);
    assert_eq!(h.screen.flash(), FlashMode::Off);
    assert_eq!(h.screen.facing(), Facing::Back);
    assert!(h.screen.captured_photo().is_none());
    assert_eq!(h.screen.caption(), "Polaroid");
}

#[tokio::test]
async fn test_permissions_lead_to_live_preview() {
    let h = mounted(granted()).await;
    assert_eq!(h.screen.view_kind(), ViewKind::Live);
    assert!(h.screen.permissions().camera.is_granted());
    assert!(h.screen.permissions().library.is_granted());
    assert_eq!(h.screen.wanted_preview(), Some(Facing::Back));
}

#[tokio::test]
async fn test_denied_camera_has_no_preview() {
    let permissions = StaticPermissions {
        camera: PermissionState::Denied,
        library: PermissionState::Granted,
    };
    let h = mounted(harness(FakeCamera::default(), FakeLibrary::default(), permissions)).await;

    assert_eq!(h.screen.view_kind(), ViewKind::Live);
    assert_eq!(h.screen.wanted_preview(), None);
    assert!(render(&h.screen).contains("No camera access"));
}

#[tokio::test]
async fn test_failed_permission_probe_counts_as_denied() {
    let h = mounted(harness(FakeCamera::default(), FakeLibrary::default(), BrokenCameraProbe)).await;

    assert_eq!(h.screen.view_kind(), ViewKind::Live, "A failed probe still resolves");
    assert_eq!(h.screen.permissions().camera, PermissionState::Denied);
    assert_eq!(h.screen.permissions().library, PermissionState::Granted);
    assert_eq!(h.screen.wanted_preview(), None);
}

#[tokio::test]
async fn test_camera_permission_can_be_requested_again() {
    let camera = Arc::new(Mutex::new(PermissionState::Denied));
    let requests = Arc::new(AtomicUsize::new(0));
    let permissions = SwitchablePermissions {
        camera: camera.clone(),
        camera_requests: requests.clone(),
    };
    let mut h = mounted(harness(FakeCamera::default(), FakeLibrary::default(), permissions)).await;
    assert_eq!(h.screen.wanted_preview(), None);
    assert_eq!(requests.load(Ordering::SeqCst), 1);

    *camera.lock().unwrap() = PermissionState::Granted;
    h.screen.perform(Message::RequestCameraPermission).await;

    assert_eq!(requests.load(Ordering::SeqCst), 2);
    assert_eq!(h.screen.permissions().camera, PermissionState::Granted);
    assert_eq!(h.screen.wanted_preview(), Some(Facing::Back));
}

#[tokio::test]
async fn test_granted_camera_is_not_requested_at_mount() {
    let permissions = SwitchablePermissions {
        camera: Arc::new(Mutex::new(PermissionState::Granted)),
        camera_requests: Arc::new(AtomicUsize::new(0)),
    };
    let requests = permissions.camera_requests.clone();
    let h = mounted(harness(FakeCamera::default(), FakeLibrary::default(), permissions)).await;

    assert_eq!(requests.load(Ordering::SeqCst), 0);
    assert!(h.screen.permissions().camera.is_granted());
}

proptest! {
    #[test]
    fn flash_cycles_with_period_three(presses in 0usize..50) {
        let mut h = granted();
        for _ in 0..presses {
            let task = h.screen.update(Message::CycleFlash);
            prop_assert!(task.is_none());
        }
        prop_assert_eq!(h.screen.flash(), FlashMode::ALL[presses % 3]);
    }

    #[test]
    fn facing_toggle_is_an_involution(presses in 0usize..50) {
        let mut h = granted();
        for _ in 0..presses {
            let _ = h.screen.update(Message::ToggleFacing);
        }
        let expected = if presses % 2 == 0 { Facing::Back } else { Facing::Front };
        prop_assert_eq!(h.screen.facing(), expected);
    }
}

#[tokio::test]
async fn test_capture_then_save() {
    let mut h = mounted(granted()).await;
    let _ = h.screen.update(Message::CycleFlash);

    h.screen.perform(Message::Capture).await;

    assert_eq!(h.screen.view_kind(), ViewKind::Review);
    assert!(!h.screen.is_capturing());
    assert_eq!(h.screen.caption(), caption_for(Local::now().date_naive()));
    let request = h.camera.last_request.lock().unwrap().unwrap();
    assert_eq!(request.flash, FlashMode::On, "Flash mode is forwarded to the camera");
    assert_eq!(request.facing, Facing::Back);

    let photo_id = h.screen.captured_photo().unwrap().id();
    h.screen.perform(Message::SaveToLibrary).await;

    assert_eq!(h.screen.view_kind(), ViewKind::Live);
    assert!(h.screen.captured_photo().is_none());
    assert_eq!(*h.library.saved.lock().unwrap(), vec![photo_id]);
    assert!(h.screen.last_saved().is_some());
}

#[tokio::test]
async fn test_capture_is_guarded_while_in_flight() {
    let mut h = mounted(granted()).await;

    let first = h.screen.update(Message::Capture);
    assert!(!first.is_none());
    assert!(h.screen.is_capturing());

    let second = h.screen.update(Message::Capture);
    assert!(second.is_none(), "Second capture must not start a task");

    let finished = first.run().await.unwrap();
    let _ = h.screen.update(finished);

    assert_eq!(h.camera.captures.load(Ordering::SeqCst), 1);
    assert_eq!(h.screen.view_kind(), ViewKind::Review);
    assert!(!h.screen.is_capturing());
}

#[tokio::test]
async fn test_facing_is_locked_while_capturing() {
    let mut h = mounted(granted()).await;

    let capture = h.screen.update(Message::Capture);
    assert!(h.screen.update(Message::ToggleFacing).is_none());
    assert_eq!(h.screen.facing(), Facing::Back, "Facing must not change mid-capture");

    let finished = capture.run().await.unwrap();
    let _ = h.screen.update(finished);
    assert_eq!(h.camera.last_request.lock().unwrap().unwrap().facing, Facing::Back);

    let _ = h.screen.update(Message::ToggleFacing);
    assert_eq!(h.screen.facing(), Facing::Front);
}

#[tokio::test]
async fn test_capture_failure_stays_live() {
    let camera = FakeCamera {
        fail: true,
        ..FakeCamera::default()
    };
    let mut h = mounted(harness(camera, FakeLibrary::default(), StaticPermissions::granted())).await;

    h.screen.perform(Message::Capture).await;

    assert_eq!(h.screen.view_kind(), ViewKind::Live);
    assert!(!h.screen.is_capturing(), "In-flight flag is cleared on failure");
    assert!(h.screen.captured_photo().is_none());
    assert!(h.screen.notice().is_some());

    // A new capture may be attempted
    assert!(!h.screen.update(Message::Capture).is_none());
}

#[tokio::test]
async fn test_retake_keeps_settings() {
    let mut h = mounted(granted()).await;
    let _ = h.screen.update(Message::CycleFlash);
    let _ = h.screen.update(Message::CycleFlash);
    let _ = h.screen.update(Message::ToggleFacing);

    h.screen.perform(Message::Capture).await;
    assert_eq!(h.screen.view_kind(), ViewKind::Review);

    h.screen.perform(Message::Retake).await;

    assert_eq!(h.screen.view_kind(), ViewKind::Live);
    assert!(h.screen.captured_photo().is_none());
    assert_eq!(h.screen.flash(), FlashMode::Auto);
    assert_eq!(h.screen.facing(), Facing::Front);
    assert!(h.library.saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_save_without_library_permission_is_a_no_op() {
    let permissions = StaticPermissions {
        camera: PermissionState::Granted,
        library: PermissionState::Denied,
    };
    let mut h = mounted(harness(FakeCamera::default(), FakeLibrary::default(), permissions)).await;
    h.screen.perform(Message::Capture).await;
    let photo_id = h.screen.captured_photo().unwrap().id();

    let task = h.screen.update(Message::SaveToLibrary);

    assert!(task.is_none());
    assert_eq!(h.screen.captured_photo().map(|p| p.id()), Some(photo_id));
    assert!(h.library.saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_save_without_photo_is_a_no_op() {
    let mut h = mounted(granted()).await;
    assert!(h.screen.update(Message::SaveToLibrary).is_none());
    assert_eq!(h.screen.view_kind(), ViewKind::Live);
}

#[tokio::test]
async fn test_save_failure_keeps_photo() {
    let library = FakeLibrary {
        fail: true,
        ..FakeLibrary::default()
    };
    let mut h = mounted(harness(FakeCamera::default(), library, StaticPermissions::granted())).await;
    h.screen.perform(Message::Capture).await;
    let photo_id = h.screen.captured_photo().unwrap().id();

    h.screen.perform(Message::SaveToLibrary).await;

    assert_eq!(h.screen.view_kind(), ViewKind::Review);
    assert_eq!(h.screen.captured_photo().map(|p| p.id()), Some(photo_id));
    assert!(!h.screen.is_saving(), "Save may be retried after a failure");
    assert!(h.screen.last_saved().is_none());
}

#[tokio::test]
async fn test_retake_during_save() {
    let mut h = mounted(granted()).await;
    h.screen.perform(Message::Capture).await;

    let save = h.screen.update(Message::SaveToLibrary);
    assert!(h.screen.is_saving());
    assert!(h.screen.update(Message::SaveToLibrary).is_none(), "Only one save at a time");

    let _ = h.screen.update(Message::Retake);
    h.screen.perform(Message::Capture).await;
    let second = h.screen.captured_photo().unwrap().id();

    let finished = save.run().await.unwrap();
    let _ = h.screen.update(finished);

    // The newer photo is still under review
    assert!(matches!(h.screen.stage(), Stage::Reviewing(review) if review.photo.id() == second));
    assert_eq!(h.library.saved.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_placeholder_actions_do_nothing() {
    let mut h = mounted(granted()).await;

    for slot in [ActionSlot::Gallery, ActionSlot::More] {
        assert!(h.screen.update(Message::Action(slot)).is_none());
    }

    assert_eq!(h.screen.view_kind(), ViewKind::Live);
    assert_eq!(h.screen.flash(), FlashMode::Off);
    assert_eq!(h.screen.facing(), Facing::Back);
    assert_eq!(h.camera.captures.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_layout_follows_stage() {
    let mut h = granted();
    assert!(render(&h.screen).contains("Requesting permissions"));

    h.screen.perform(Message::RequestPermissions).await;
    let live = render(&h.screen);
    assert!(!live.contains("Retake"), "Live layout has no review actions");
    assert!(live.contains("Gallery"));

    h.screen.perform(Message::Capture).await;
    let review = render(&h.screen);
    assert!(review.contains("Retake"));
    assert!(review.contains(h.screen.caption()));
    assert!(!review.contains("Gallery"));
}
