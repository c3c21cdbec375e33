//! Line-oriented front end: prompts and dialogs on stdout, commands on stdin.

use std::io::{BufRead, Write};
use std::thread::JoinHandle;

use crossbeam_channel::Sender;
use log::{debug, warn};
use thiserror::Error;

use firekiosk_core::ReleaseInfo;

use crate::message::Message;
use crate::presenter::{MenuItem, Notice, Presenter};
use crate::settings::Orientation;

pub const HELP: &str = "\
Commands:
  menu                 open the options menu
  1 | 2 | 3            pick a menu entry
  update               check for updates
  status               show update progress
  install | later      answer an update offer
  url <address>        show <address>
  cancel               cancel URL entry
  orientation <mode>   auto, landscape, portrait, reverse_landscape, reverse_portrait
  quit";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("unknown orientation `{0}`")]
    UnknownOrientation(String),
    #[error("no menu entry {0}")]
    NoSuchMenuEntry(String),
}

/// Turn one input line into a message for the kiosk.
pub fn parse_command(line: &str) -> Result<Message, CommandError> {
    let line = line.trim();
    let (command, argument) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(command, rest)| (command, rest.trim()));

    match command {
        "menu" => Ok(Message::OpenMenu),
        "update" => Ok(Message::CheckForUpdate { silent: false }),
        "status" => Ok(Message::ShowStatus),
        "install" => Ok(Message::ConfirmInstall),
        "later" => Ok(Message::DeferInstall),
        "url" => Ok(Message::UrlEntered(argument.to_string())),
        "cancel" => Ok(Message::UrlEntryCancelled),
        "orientation" => Orientation::from_name(argument)
            .map(Message::OrientationSelected)
            .ok_or_else(|| CommandError::UnknownOrientation(argument.to_string())),
        "quit" | "exit" => Ok(Message::Quit),
        entry if entry.chars().all(|c| c.is_ascii_digit()) && !entry.is_empty() => entry
            .parse::<usize>()
            .ok()
            .and_then(|index| index.checked_sub(1))
            .and_then(|index| MenuItem::ALL.get(index).copied())
            .map(Message::MenuItemSelected)
            .ok_or_else(|| CommandError::NoSuchMenuEntry(entry.to_string())),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

/// Read commands from stdin on a dedicated thread.
///
/// End of input stops the reader but not the kiosk, so it keeps running
/// when started without a terminal.
pub fn spawn_input_reader(sender: Sender<Message>) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("console-input".to_string())
        .spawn(move || read_commands(std::io::stdin().lock(), &sender))
}

fn read_commands(input: impl BufRead, sender: &Sender<Message>) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(error) => {
                warn!("Failed to read console input: {error}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Ok(message) => {
                if sender.send(message).is_err() {
                    break;
                }
            }
            Err(error) => println!("{error}\n{HELP}"),
        }
    }
    debug!("Console input closed");
}

/// Presenter that writes everything as plain text.
pub struct ConsolePresenter<W: Write> {
    out: W,
}

impl<W: Write> ConsolePresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn emit(&mut self, text: &str) {
        if let Err(error) = writeln!(self.out, "{text}").and_then(|()| self.out.flush()) {
            warn!("Failed to write to console: {error}");
        }
    }
}

impl<W: Write> Presenter for ConsolePresenter<W> {
    fn show_notice(&mut self, notice: &Notice) {
        self.emit(&format!("[{}]\n{}", notice.title(), notice.body()));
    }

    fn prompt_install(&mut self, release: &ReleaseInfo) {
        let mut text = format!("[Update available]\nNew version available: {}", release.tag);
        if let Some(notes) = release
            .release_notes
            .as_deref()
            .filter(|notes| !notes.trim().is_empty())
        {
            text.push_str("\n\n");
            text.push_str(notes.trim());
        }
        text.push_str("\n\nType `install` to install now or `later` to skip.");
        self.emit(&text);
    }

    fn show_download_progress(&mut self, downloaded: u64, total: u64) {
        if total > 0 {
            self.emit(&format!("Downloading update: {downloaded} / {total} bytes"));
        } else {
            self.emit(&format!("Downloading update: {downloaded} bytes"));
        }
    }

    fn show_status(&mut self, summary: &str) {
        self.emit(&format!("Update status: {summary}"));
    }

    fn show_menu(&mut self, items: &[MenuItem]) {
        let mut text = String::from("[Options]");
        for (index, item) in items.iter().enumerate() {
            text.push_str(&format!("\n  {}. {}", index + 1, item.label()));
        }
        self.emit(&text);
    }

    fn show_orientation_choices(&mut self, current: Orientation) {
        let mut text = String::from("[Orientation]");
        for orientation in Orientation::ALL {
            let marker = if orientation == current { '*' } else { ' ' };
            text.push_str(&format!(
                "\n {marker} {:<18} {}",
                orientation.as_str(),
                orientation.label()
            ));
        }
        text.push_str("\nType `orientation <mode>` to choose.");
        self.emit(&text);
    }

    fn request_url(&mut self, initial: bool, current: &str) {
        let title = if initial { "[Enter URL]" } else { "[Change URL]" };
        self.emit(&format!(
            "{title}\nCurrent: {current}\nType `url <address>` or `cancel`."
        ));
    }

    fn load_url(&mut self, url: &str) {
        self.emit(&format!("Showing {url}"));
    }

    fn apply_orientation(&mut self, orientation: Orientation) {
        self.emit(&format!("Orientation: {}", orientation.label()));
    }
}
