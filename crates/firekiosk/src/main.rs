mod app;
mod console;
mod error;
mod logging;
mod message;
mod presenter;
mod settings;
mod single_instance;
mod state;

use std::process::ExitCode;
use std::sync::Arc;

use log::{error, info};

use firekiosk_platform::{AppPaths, SystemInstaller};

use crate::app::{Kiosk, KioskContext, TaskRunner};
use crate::console::ConsolePresenter;
use crate::settings::KioskSettings;
use crate::single_instance::{AcquireError, SingleInstance};

fn main() -> ExitCode {
    let paths = match AppPaths::new() {
        Ok(paths) => paths,
        Err(error) => {
            eprintln!("firekiosk: {error}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(error) = paths.ensure_dirs() {
        eprintln!("firekiosk: cannot create application directories: {error}");
        return ExitCode::FAILURE;
    }

    let settings = KioskSettings::load_from(&paths.settings_file());
    logging::init_logging(
        &paths.log_file(),
        settings.debug_logging,
        settings.max_log_size_bytes,
    );

    let _instance = match SingleInstance::acquire(&paths.instance_lock_file()) {
        Ok(instance) => instance,
        Err(AcquireError::AlreadyRunning) => {
            info!("Another instance is already running; exiting");
            eprintln!("firekiosk: {}", AcquireError::AlreadyRunning);
            return ExitCode::SUCCESS;
        }
        Err(error) => {
            error!("{error}");
            eprintln!("firekiosk: {error}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("firekiosk-worker")
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            error!("Failed to start async runtime: {error}");
            eprintln!("firekiosk: {error}");
            return ExitCode::FAILURE;
        }
    };

    let (sender, receiver) = crossbeam_channel::unbounded();
    if let Err(error) = console::spawn_input_reader(sender.clone()) {
        error!("Failed to start console input: {error}");
        return ExitCode::FAILURE;
    }
    println!("{}", console::HELP);

    let installer = Arc::new(SystemInstaller::new(paths.settings_file()));
    let mut kiosk = match Kiosk::new(
        settings,
        KioskContext::from_paths(&paths),
        Box::new(ConsolePresenter::new(std::io::stdout())),
        installer,
        TaskRunner::new(runtime.handle().clone(), sender),
    ) {
        Ok(kiosk) => kiosk,
        Err(error) => {
            error!("Failed to build HTTP clients: {error}");
            eprintln!("firekiosk: {error}");
            return ExitCode::FAILURE;
        }
    };

    kiosk.boot();
    kiosk.run(&receiver);

    runtime.shutdown_timeout(std::time::Duration::from_secs(1));
    info!("FireKiosk stopped");
    ExitCode::SUCCESS
}
