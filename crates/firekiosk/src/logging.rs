use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[cfg(debug_assertions)]
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use simplelog::{CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, WriteLogger};

/// Log sink that reopens its file when the file is removed underneath it,
/// for example by someone clearing logs on a long-running kiosk.
struct ReopeningLogWriter {
    path: PathBuf,
    file: File,
}

impl ReopeningLogWriter {
    fn open(path: PathBuf) -> io::Result<Self> {
        let file = open_for_append(&path)?;
        Ok(Self { path, file })
    }

    fn reopen_if_removed(&mut self) -> io::Result<()> {
        if !self.path.exists() {
            self.file = open_for_append(&self.path)?;
        }
        Ok(())
    }
}

impl Write for ReopeningLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.reopen_if_removed()?;
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn open_for_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Shrink the log to its newest lines once it outgrows `max_size`, keeping
/// at most half of the limit.
fn shrink_oversized_log(log_path: &Path, max_size: u64) -> io::Result<()> {
    if std::fs::metadata(log_path)?.len() <= max_size {
        return Ok(());
    }

    let contents = std::fs::read(log_path)?;
    let keep = usize::try_from(max_size / 2).unwrap_or(usize::MAX);
    let start = contents.len().saturating_sub(keep);
    let line_start = contents[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(contents.len(), |pos| start + pos + 1);
    let line_start = if start == 0 { 0 } else { line_start };

    std::fs::write(log_path, &contents[line_start..])
}

/// Route the `log` facade into `log_path` (and stderr in debug builds).
pub fn init_logging(log_path: &Path, debug_enabled: bool, max_log_size: u64) {
    if let Err(error) = shrink_oversized_log(log_path, max_log_size)
        && error.kind() != io::ErrorKind::NotFound
    {
        eprintln!("firekiosk: could not shrink {}: {error}", log_path.display());
    }

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("firekiosk")
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    match ReopeningLogWriter::open(log_path.to_path_buf()) {
        Ok(writer) => loggers.push(WriteLogger::new(LevelFilter::Debug, config.clone(), writer)),
        Err(error) => eprintln!("firekiosk: cannot open {}: {error}", log_path.display()),
    }

    #[cfg(debug_assertions)]
    loggers.push(TermLogger::new(
        LevelFilter::Debug,
        config,
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ));

    if loggers.is_empty() || CombinedLogger::init(loggers).is_err() {
        return;
    }

    set_debug_logging(debug_enabled);
    log::info!(
        "FireKiosk {} logging to {}",
        env!("CARGO_PKG_VERSION"),
        log_path.display()
    );
}

/// Debug output is opt-in; info and above are always recorded so that
/// unattended update failures leave a trace.
pub fn set_debug_logging(enabled: bool) {
    if enabled {
        log::set_max_level(log::LevelFilter::Debug);
    } else {
        log::set_max_level(log::LevelFilter::Info);
    }
}
