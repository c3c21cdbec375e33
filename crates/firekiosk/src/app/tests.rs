use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use serde_json::json;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use firekiosk_core::ReleaseInfo;
use firekiosk_platform::{Installer, InstallerError, PACKAGE_MIME_TYPE};

use super::{Kiosk, KioskContext, TaskRunner};
use crate::message::Message;
use crate::presenter::recording::{RecordingPresenter, Shown};
use crate::presenter::{MenuItem, Notice};
use crate::settings::{DEFAULT_URL, KioskSettings, Orientation};
use crate::state::UpdateState;

const CURRENT_VERSION: &str = "1.4.0";
const FEED_PATH: &str = "/releases/latest";
const ARTIFACT_PATH: &str = "/download/firekiosk.apk";
const PACKAGE_BYTES: &[u8] = b"firekiosk update package";

#[derive(Default)]
struct FakeInstaller {
    permitted: AtomicBool,
    fail_launch: AtomicBool,
    fail_settings: AtomicBool,
    settings_opened: AtomicUsize,
    launched: Mutex<Vec<(PathBuf, String)>>,
}

impl FakeInstaller {
    fn permitted() -> Self {
        let installer = Self::default();
        installer.permitted.store(true, Ordering::SeqCst);
        installer
    }

    fn launched(&self) -> Vec<(PathBuf, String)> {
        self.launched
            .lock()
            .expect("launch log should not be poisoned")
            .clone()
    }
}

impl Installer for FakeInstaller {
    fn can_request_package_installs(&self) -> bool {
        self.permitted.load(Ordering::SeqCst)
    }

    fn open_permission_settings(&self) -> Result<(), InstallerError> {
        self.settings_opened.fetch_add(1, Ordering::SeqCst);
        if self.fail_settings.load(Ordering::SeqCst) {
            return Err(InstallerError::Open {
                target: PathBuf::from("settings.json"),
                source: std::io::Error::other("no opener"),
            });
        }
        Ok(())
    }

    fn launch_installer(&self, package: &Path, mime_type: &str) -> Result<(), InstallerError> {
        if self.fail_launch.load(Ordering::SeqCst) {
            return Err(InstallerError::MissingPackage {
                path: package.to_path_buf(),
            });
        }
        self.launched
            .lock()
            .expect("launch log should not be poisoned")
            .push((package.to_path_buf(), mime_type.to_string()));
        Ok(())
    }
}

struct Harness {
    kiosk: Kiosk,
    presenter: RecordingPresenter,
    installer: Arc<FakeInstaller>,
    sender: Sender<Message>,
    receiver: Receiver<Message>,
    server: MockServer,
    temp: TempDir,
    runtime: tokio::runtime::Runtime,
}

impl Harness {
    fn new(installer: FakeInstaller, configure: impl FnOnce(&mut KioskSettings)) -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("runtime should build");
        let server = runtime.block_on(MockServer::start());
        let temp = tempfile::tempdir().expect("tempdir should be created");

        let mut settings = KioskSettings {
            last_url: Some("https://board.local".to_string()),
            check_on_startup: false,
            feed_url: format!("{}{FEED_PATH}", server.uri()),
            artifact_url: format!("{}{ARTIFACT_PATH}", server.uri()),
            require_https: false,
            ..KioskSettings::default()
        };
        configure(&mut settings);

        let context = KioskContext {
            current_version: CURRENT_VERSION.to_string(),
            settings_file: temp.path().join("config").join("settings.json"),
            artifact_file: temp.path().join("cache").join("update.apk"),
        };

        let (sender, receiver) = crossbeam_channel::unbounded();
        let runner = TaskRunner::new(runtime.handle().clone(), sender.clone());
        let presenter = RecordingPresenter::default();
        let installer = Arc::new(installer);

        let kiosk = Kiosk::new(
            settings,
            context,
            Box::new(presenter.clone()),
            installer.clone(),
            runner,
        )
        .expect("kiosk should build");

        Self {
            kiosk,
            presenter,
            installer,
            sender,
            receiver,
            server,
            temp,
            runtime,
        }
    }

    fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    fn serve_release(&self, tag: &str) {
        self.mount(
            Mock::given(method("GET"))
                .and(path(FEED_PATH))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "tag_name": tag,
                    "html_url": "https://github.com/hbtdul/FireTV-Kiosk/releases/latest",
                    "body": "Bug fixes"
                }))),
        );
    }

    fn serve_package(&self) {
        self.mount(
            Mock::given(method("GET"))
                .and(path(ARTIFACT_PATH))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(PACKAGE_BYTES)),
        );
    }

    /// Address of a one-shot server that announces more bytes than it
    /// sends before hanging up.
    fn serve_cut_short_package(&self) -> String {
        self.runtime.block_on(async {
            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("listener should bind");
            let addr = listener.local_addr().expect("listener has an address");
            tokio::spawn(async move {
                if let Ok((mut socket, _)) = listener.accept().await {
                    let mut request = [0_u8; 2048];
                    let _ = socket.read(&mut request).await;
                    let _ = socket
                        .write_all(
                            b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\nConnection: close\r\n\r\npartial",
                        )
                        .await;
                    let _ = socket.shutdown().await;
                }
            });
            format!("http://{addr}{ARTIFACT_PATH}")
        })
    }

    fn artifact_file(&self) -> PathBuf {
        self.kiosk.context.artifact_file.clone()
    }

    fn saved_settings(&self) -> KioskSettings {
        KioskSettings::load_from(&self.kiosk.context.settings_file)
    }

    /// Feed background results back into the kiosk until `done` holds.
    fn pump_until(&mut self, done: impl Fn(&UpdateState) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(15);
        while !done(&self.kiosk.update_state) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let message = self
                .receiver
                .recv_timeout(remaining)
                .expect("kiosk should settle before the deadline");
            self.kiosk.update(message);
        }
    }

    fn check(&mut self, silent: bool) {
        self.kiosk.update(Message::CheckForUpdate { silent });
        self.pump_until(|state| !matches!(state, UpdateState::Checking));
    }

    fn confirm_install(&mut self) {
        self.kiosk.update(Message::ConfirmInstall);
        self.pump_until(|state| !state.is_downloading());
    }
}

#[test]
fn startup_check_offers_newer_release() {
    let mut harness = Harness::new(FakeInstaller::permitted(), |settings| {
        settings.check_on_startup = true;
    });
    harness.serve_release("v1.5.0");

    harness.kiosk.boot();
    harness.pump_until(|state| !matches!(state, UpdateState::Checking));

    assert_eq!(
        harness.presenter.all(),
        vec![
            Shown::Orientation(Orientation::Auto),
            Shown::LoadedUrl("https://board.local".to_string()),
            Shown::InstallPrompt("v1.5.0".to_string()),
        ]
    );
    assert!(matches!(
        &harness.kiosk.update_state,
        UpdateState::UpdateAvailable(release) if release.tag == "v1.5.0"
    ));
    assert!(harness.saved_settings().last_update_check.is_some());
}

#[test]
fn startup_check_is_skipped_when_disabled() {
    let mut harness = Harness::new(FakeInstaller::permitted(), |_| {});

    harness.kiosk.boot();

    assert_eq!(harness.kiosk.update_state, UpdateState::Idle);
    assert!(harness.receiver.try_recv().is_err());
}

#[test]
fn silent_check_on_latest_version_shows_nothing() {
    let mut harness = Harness::new(FakeInstaller::permitted(), |_| {});
    harness.serve_release("v1.4.0");

    harness.check(true);

    assert!(harness.presenter.dialogs().is_empty());
    assert_eq!(harness.kiosk.update_state, UpdateState::UpToDate);
}

#[test]
fn manual_check_on_latest_version_reports_current_version() {
    let mut harness = Harness::new(FakeInstaller::permitted(), |_| {});
    harness.serve_release("1.4");

    harness.check(false);

    assert_eq!(
        harness.presenter.dialogs(),
        vec![Shown::Notice(Notice::UpToDate {
            current_version: CURRENT_VERSION.to_string()
        })]
    );
}

#[test]
fn older_remote_release_is_not_offered() {
    let mut harness = Harness::new(FakeInstaller::permitted(), |_| {});
    harness.serve_release("v1.3.9");

    harness.check(true);

    assert!(harness.presenter.dialogs().is_empty());
    assert!(harness.kiosk.offered_release.is_none());
}

#[test]
fn silent_check_failure_is_only_logged() {
    let mut harness = Harness::new(FakeInstaller::permitted(), |_| {});
    harness.mount(
        Mock::given(method("GET"))
            .and(path(FEED_PATH))
            .respond_with(ResponseTemplate::new(500)),
    );

    harness.check(true);

    assert!(harness.presenter.dialogs().is_empty());
    assert!(matches!(
        harness.kiosk.update_state,
        UpdateState::CheckFailed(_)
    ));
    assert!(harness.saved_settings().last_update_check.is_none());
}

#[test]
fn manual_check_failure_shows_error_dialog() {
    let mut harness = Harness::new(FakeInstaller::permitted(), |_| {});
    harness.mount(
        Mock::given(method("GET"))
            .and(path(FEED_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>")),
    );

    harness.check(false);

    let dialogs = harness.presenter.dialogs();
    assert_eq!(dialogs.len(), 1);
    assert!(matches!(
        &dialogs[0],
        Shown::Notice(Notice::CheckFailed { details }) if details.contains("parse")
    ));
}

#[test]
fn manual_check_times_out_instead_of_hanging() {
    let mut harness = Harness::new(FakeInstaller::permitted(), |settings| {
        settings.feed_timeout_secs = 1;
    });
    harness.mount(
        Mock::given(method("GET"))
            .and(path(FEED_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "tag_name": "v9.0.0" }))
                    .set_delay(Duration::from_secs(5)),
            ),
    );

    let started = Instant::now();
    harness.check(false);

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(matches!(
        harness.presenter.dialogs().as_slice(),
        [Shown::Notice(Notice::CheckFailed { details })] if details.contains("timed out")
    ));
}

#[test]
fn confirmed_install_downloads_and_hands_off_package() {
    let mut harness = Harness::new(FakeInstaller::permitted(), |_| {});
    harness.serve_release("v2.0.0");
    harness.serve_package();

    harness.check(true);
    harness.confirm_install();

    let artifact_file = harness.artifact_file();
    assert_eq!(
        std::fs::read(&artifact_file).expect("package should be on disk"),
        PACKAGE_BYTES
    );
    assert_eq!(
        harness.installer.launched(),
        vec![(artifact_file, PACKAGE_MIME_TYPE.to_string())]
    );
    assert!(matches!(
        &harness.kiosk.update_state,
        UpdateState::HandedOff(artifact) if artifact.size == PACKAGE_BYTES.len() as u64
    ));

    let total = PACKAGE_BYTES.len() as u64;
    assert!(harness.presenter.all().contains(&Shown::Progress {
        downloaded: total,
        total
    }));
}

#[test]
fn download_replaces_stale_scratch_file() {
    let mut harness = Harness::new(FakeInstaller::permitted(), |_| {});
    harness.serve_release("v2.0.0");
    harness.serve_package();
    let artifact_file = harness.artifact_file();
    std::fs::create_dir_all(artifact_file.parent().expect("scratch file has a parent"))
        .expect("cache dir should be created");
    std::fs::write(&artifact_file, vec![b'x'; 4096]).expect("stale file should be written");

    harness.check(true);
    harness.confirm_install();

    assert_eq!(
        std::fs::read(&artifact_file).expect("package should be on disk"),
        PACKAGE_BYTES
    );
}

#[test]
fn missing_install_permission_opens_settings_without_installing() {
    let mut harness = Harness::new(FakeInstaller::default(), |_| {});
    harness.serve_release("v2.0.0");
    harness.serve_package();

    harness.check(true);
    harness.confirm_install();

    assert_eq!(harness.installer.settings_opened.load(Ordering::SeqCst), 1);
    assert!(harness.installer.launched().is_empty());
    assert!(matches!(
        harness.kiosk.update_state,
        UpdateState::PermissionRequired(_)
    ));
    assert_eq!(
        harness.presenter.dialogs(),
        vec![Shown::InstallPrompt("v2.0.0".to_string())]
    );
}

#[test]
fn unopenable_permission_settings_are_reported() {
    let installer = FakeInstaller::default();
    installer.fail_settings.store(true, Ordering::SeqCst);
    let mut harness = Harness::new(installer, |_| {});
    harness.serve_release("v2.0.0");
    harness.serve_package();

    harness.check(true);
    harness.confirm_install();

    assert!(matches!(
        harness.presenter.dialogs().last(),
        Some(Shown::Notice(Notice::InstallFailed { details }))
            if details.starts_with("Installing updates from unknown sources is not allowed")
    ));
    assert!(matches!(
        harness.kiosk.update_state,
        UpdateState::InstallFailed(_)
    ));
}

#[test]
fn failed_download_shows_error_and_leaves_no_package() {
    let mut harness = Harness::new(FakeInstaller::permitted(), |_| {});
    harness.serve_release("v2.0.0");
    harness.mount(
        Mock::given(method("GET"))
            .and(path(ARTIFACT_PATH))
            .respond_with(ResponseTemplate::new(404)),
    );

    harness.check(true);
    harness.confirm_install();

    assert!(matches!(
        harness.presenter.dialogs().last(),
        Some(Shown::Notice(Notice::DownloadFailed { details })) if details.contains("404")
    ));
    assert!(matches!(
        harness.kiosk.update_state,
        UpdateState::DownloadFailed(_)
    ));
    assert!(!harness.artifact_file().exists());
    assert!(harness.installer.launched().is_empty());
}

#[test]
fn download_cut_short_after_silent_check_is_reported_and_retry_overwrites() {
    let mut harness = Harness::new(FakeInstaller::permitted(), |_| {});
    harness.serve_release("v2.0.0");
    harness.serve_package();
    let artifact_file = harness.artifact_file();
    std::fs::create_dir_all(artifact_file.parent().expect("scratch file has a parent"))
        .expect("cache dir should be created");
    std::fs::write(&artifact_file, vec![b'x'; 5000]).expect("stale file should be written");
    let full_package_url = harness.kiosk.settings.artifact_url.clone();
    harness.kiosk.settings.artifact_url = harness.serve_cut_short_package();

    harness.check(true);
    harness.confirm_install();

    assert!(matches!(
        harness.presenter.dialogs().as_slice(),
        [
            Shown::InstallPrompt(tag),
            Shown::Notice(Notice::DownloadFailed { details }),
        ] if tag == "v2.0.0" && !details.is_empty()
    ));
    assert!(matches!(
        harness.kiosk.update_state,
        UpdateState::DownloadFailed(_)
    ));
    assert!(!artifact_file.exists());
    assert!(harness.installer.launched().is_empty());

    harness.kiosk.settings.artifact_url = full_package_url;
    harness.check(true);
    harness.confirm_install();

    assert_eq!(
        std::fs::read(&artifact_file).expect("package should be on disk"),
        PACKAGE_BYTES
    );
    assert!(matches!(
        harness.kiosk.update_state,
        UpdateState::HandedOff(_)
    ));
}

#[test]
fn plain_http_feed_is_refused_when_https_is_required() {
    let mut harness = Harness::new(FakeInstaller::permitted(), |settings| {
        settings.require_https = true;
    });
    harness.serve_release("v2.0.0");

    harness.check(false);

    assert!(matches!(
        harness.presenter.dialogs().as_slice(),
        [Shown::Notice(Notice::CheckFailed { .. })]
    ));
    assert!(harness.kiosk.offered_release.is_none());
}

#[test]
fn installer_launch_failure_is_reported() {
    let installer = FakeInstaller::permitted();
    installer.fail_launch.store(true, Ordering::SeqCst);
    let mut harness = Harness::new(installer, |_| {});
    harness.serve_release("v2.0.0");
    harness.serve_package();

    harness.check(true);
    harness.confirm_install();

    assert!(matches!(
        harness.presenter.dialogs().last(),
        Some(Shown::Notice(Notice::InstallFailed { .. }))
    ));
}

#[test]
fn deferring_drops_the_offer() {
    let mut harness = Harness::new(FakeInstaller::permitted(), |_| {});
    harness.serve_release("v2.0.0");

    harness.check(true);
    harness.kiosk.update(Message::DeferInstall);
    harness.kiosk.update(Message::ConfirmInstall);

    assert_eq!(harness.kiosk.update_state, UpdateState::Idle);
    assert!(harness.kiosk.offered_release.is_none());
    assert!(harness.receiver.try_recv().is_err());
}

#[test]
fn confirm_during_download_is_ignored() {
    let mut harness = Harness::new(FakeInstaller::permitted(), |_| {});
    let downloading = UpdateState::Downloading {
        release: ReleaseInfo::from_tag("v2.0.0"),
        downloaded: 10,
        total: 100,
    };
    harness.kiosk.update_state = downloading.clone();
    harness.kiosk.offered_release = Some(ReleaseInfo::from_tag("v2.1.0"));

    harness.kiosk.update(Message::ConfirmInstall);

    assert_eq!(harness.kiosk.update_state, downloading);
    assert!(harness.kiosk.offered_release.is_some());
    assert!(harness.receiver.try_recv().is_err());
}

#[test]
fn update_found_during_download_is_not_prompted() {
    let mut harness = Harness::new(FakeInstaller::permitted(), |_| {});
    harness.kiosk.update_state = UpdateState::Downloading {
        release: ReleaseInfo::from_tag("v2.0.0"),
        downloaded: 0,
        total: 0,
    };

    harness.kiosk.update(Message::UpdateChecked {
        silent: false,
        result: Box::new(Ok(Some(ReleaseInfo::from_tag("v2.0.0")))),
    });

    assert!(harness.presenter.dialogs().is_empty());
    assert!(harness.kiosk.update_state.is_downloading());
}

#[test]
fn boot_removes_leftover_package() {
    let mut harness = Harness::new(FakeInstaller::permitted(), |_| {});
    let artifact_file = harness.artifact_file();
    std::fs::create_dir_all(artifact_file.parent().expect("scratch file has a parent"))
        .expect("cache dir should be created");
    std::fs::write(&artifact_file, b"old").expect("stale file should be written");

    harness.kiosk.boot();

    assert!(!artifact_file.exists());
}

#[test]
fn first_start_asks_for_url_and_falls_back_on_cancel() {
    let mut harness = Harness::new(FakeInstaller::permitted(), |settings| {
        settings.last_url = None;
    });

    harness.kiosk.boot();
    harness.kiosk.update(Message::UrlEntryCancelled);

    assert_eq!(
        harness.presenter.all(),
        vec![
            Shown::Orientation(Orientation::Auto),
            Shown::UrlRequest {
                initial: true,
                current: DEFAULT_URL.to_string()
            },
            Shown::LoadedUrl(DEFAULT_URL.to_string()),
        ]
    );
    assert_eq!(
        harness.saved_settings().last_url.as_deref(),
        Some(DEFAULT_URL)
    );
}

#[test]
fn blank_url_asks_again_and_bare_host_gets_https() {
    let mut harness = Harness::new(FakeInstaller::permitted(), |settings| {
        settings.last_url = None;
    });

    harness.kiosk.boot();
    harness.kiosk.update(Message::UrlEntered("   ".to_string()));
    harness.kiosk.update(Message::UrlEntered("intranet.local/board".to_string()));

    let shown = harness.presenter.all();
    assert_eq!(
        &shown[1..],
        &[
            Shown::UrlRequest {
                initial: true,
                current: DEFAULT_URL.to_string()
            },
            Shown::UrlRequest {
                initial: true,
                current: DEFAULT_URL.to_string()
            },
            Shown::LoadedUrl("https://intranet.local/board".to_string()),
        ]
    );
    assert_eq!(
        harness.saved_settings().last_url.as_deref(),
        Some("https://intranet.local/board")
    );
}

#[test]
fn cancelling_url_change_keeps_current_page() {
    let mut harness = Harness::new(FakeInstaller::permitted(), |_| {});

    harness.kiosk.update(Message::OpenMenu);
    harness
        .kiosk
        .update(Message::MenuItemSelected(MenuItem::ChangeUrl));
    harness.kiosk.update(Message::UrlEntryCancelled);

    assert_eq!(
        harness.presenter.all(),
        vec![
            Shown::Menu(MenuItem::ALL.to_vec()),
            Shown::UrlRequest {
                initial: false,
                current: "https://board.local".to_string()
            },
        ]
    );
}

#[test]
fn menu_check_for_updates_is_not_silent() {
    let mut harness = Harness::new(FakeInstaller::permitted(), |_| {});
    harness.serve_release("v1.4.0");

    harness
        .kiosk
        .update(Message::MenuItemSelected(MenuItem::CheckForUpdates));
    harness.pump_until(|state| !matches!(state, UpdateState::Checking));

    assert_eq!(
        harness.presenter.dialogs(),
        vec![Shown::Notice(Notice::UpToDate {
            current_version: CURRENT_VERSION.to_string()
        })]
    );
}

#[test]
fn orientation_choice_is_applied_and_saved() {
    let mut harness = Harness::new(FakeInstaller::permitted(), |_| {});

    harness
        .kiosk
        .update(Message::MenuItemSelected(MenuItem::Orientation));
    harness
        .kiosk
        .update(Message::OrientationSelected(Orientation::Portrait));

    assert_eq!(
        harness.presenter.all(),
        vec![
            Shown::OrientationChoices(Orientation::Auto),
            Shown::Orientation(Orientation::Portrait),
        ]
    );
    assert_eq!(harness.saved_settings().orientation, Orientation::Portrait);
}

#[test]
fn saving_settings_keeps_manual_install_grant() {
    let mut harness = Harness::new(FakeInstaller::permitted(), |_| {});
    let granted = KioskSettings {
        allow_unknown_sources: true,
        ..KioskSettings::default()
    };
    granted
        .save_to(&harness.kiosk.context.settings_file)
        .expect("settings should be written");

    harness
        .kiosk
        .update(Message::OrientationSelected(Orientation::Landscape));

    let saved = harness.saved_settings();
    assert!(saved.allow_unknown_sources);
    assert_eq!(saved.orientation, Orientation::Landscape);
    assert!(harness.temp.path().join("config").join("settings.json").exists());
}

#[test]
fn status_reports_download_outcome() {
    let mut harness = Harness::new(FakeInstaller::default(), |_| {});
    harness.serve_release("v2.0.0");
    harness.serve_package();

    harness.check(true);
    harness.confirm_install();
    harness.kiosk.update(Message::ShowStatus);

    let expected = format!(
        "{} is waiting for permission to install",
        harness.artifact_file().display()
    );
    assert_eq!(harness.presenter.all().last(), Some(&Shown::Status(expected)));
}

#[test]
fn run_returns_on_quit() {
    let mut harness = Harness::new(FakeInstaller::permitted(), |_| {});
    harness
        .sender
        .send(Message::OpenMenu)
        .expect("channel should be open");
    harness
        .sender
        .send(Message::Quit)
        .expect("channel should be open");

    let receiver = harness.receiver.clone();
    harness.kiosk.run(&receiver);

    assert_eq!(
        harness.presenter.all(),
        vec![Shown::Menu(MenuItem::ALL.to_vec())]
    );
}
