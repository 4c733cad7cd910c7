//! Line-based front end for a browser session.

use anyhow::Result;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use file_catalog::app::{spawn_session, Command, UserEvent};
use file_catalog::config::{AppConfig, ConfigStore};
use file_catalog::core::{NotificationEvent, Severity, TransferMode};

const HELP: &str = "\
commands:
  ls                     re-list the current directory
  cd <dir>               change directory (relative or absolute)
  open <name>            enter a folder or open a file
  back                   go back in history
  filter <mode>          all | images | text | code
  sort <mode>            nameAsc | nameDesc | sizeAsc | sizeDesc | dateAsc | dateDesc | type
  info <name>            show metadata and a preview
  find [query]           search below the current directory; blank clears
  copy <name>            put an item on the clipboard
  cut <name>             put an item on the clipboard for moving
  paste                  paste the clipboard here
  rm <name>              delete an item
  mv <name> <new name>   rename an item
  touch <name>           create an empty file
  mkdir <name>           create a folder
  help                   show this text
  quit                   leave";

#[derive(Debug, PartialEq)]
enum Input {
    Command(Command),
    Help,
    Quit,
    Empty,
}

fn parse_line(line: &str) -> Result<Input, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let path = || -> Result<PathBuf, String> {
        if rest.is_empty() {
            Err(format!("'{}' needs a name", word))
        } else {
            Ok(PathBuf::from(rest))
        }
    };
    let name = || -> Result<String, String> {
        if rest.is_empty() {
            Err(format!("'{}' needs a name", word))
        } else {
            Ok(rest.to_string())
        }
    };

    let command = match word {
        "" => return Ok(Input::Empty),
        "help" | "?" => return Ok(Input::Help),
        "quit" | "exit" | "q" => return Ok(Input::Quit),
        "ls" | "refresh" => Command::Refresh,
        "cd" => Command::ChangeDirectory(path()?),
        "open" => Command::OpenItem(path()?),
        "back" => Command::GoBack,
        "filter" => Command::SetFilter(rest.parse()?),
        "sort" => Command::SetSort(rest.parse()?),
        "info" => Command::Select(path()?),
        "find" | "search" => Command::Search(rest.to_string()),
        "copy" => Command::Copy(path()?),
        "cut" => Command::Cut(path()?),
        "paste" => Command::Paste,
        "rm" | "delete" => Command::Delete(path()?),
        "mv" | "rename" => {
            let Some((from, to)) = rest.split_once(char::is_whitespace) else {
                return Err("usage: mv <name> <new name>".to_string());
            };
            Command::Rename {
                path: PathBuf::from(from),
                new_name: to.trim().to_string(),
            }
        }
        "touch" => Command::CreateFile(name()?),
        "mkdir" => Command::CreateFolder(name()?),
        other => return Err(format!("unknown command '{}', try 'help'", other)),
    };
    Ok(Input::Command(command))
}

fn render(event: UserEvent) {
    match event {
        UserEvent::CatalogUpdated(view) => {
            for entry in &view.entries {
                println!("  {:<40} {:>12}", entry.display_name(), entry.size_display);
            }
        }
        UserEvent::SearchResults { matches, .. } => {
            for found in &matches {
                println!("  {}", found.display_name);
            }
        }
        UserEvent::SearchCleared => {}
        UserEvent::ItemInfo(info) => {
            println!("{}\n", info.metadata.summary());
            println!("{}", info.preview);
        }
        UserEvent::History { current, .. } => println!("[{}]", current.display()),
        UserEvent::ClipboardChanged(Some(item)) => {
            let verb = match item.mode {
                TransferMode::Copy => "copy",
                TransferMode::Cut => "move",
            };
            println!("clipboard: {} {}", verb, item.source.display());
        }
        UserEvent::ClipboardChanged(None) => println!("clipboard: empty"),
        UserEvent::Notification(NotificationEvent::Entered {
            message, severity, ..
        }) => match severity {
            Severity::Info => println!("* {}", message),
            Severity::Error => eprintln!("! {}", message),
        },
        UserEvent::Notification(_) => {}
        UserEvent::Status(status) => tracing::debug!("status: {}", status),
    }
}

pub async fn run(config: AppConfig, store: ConfigStore) -> Result<()> {
    let (proxy, mut events) = mpsc::unbounded_channel();
    let session = spawn_session(config, store, proxy);

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            render(event);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(Input::Command(command)) => {
                if !session.send(command) {
                    break;
                }
            }
            Ok(Input::Help) => println!("{}", HELP),
            Ok(Input::Quit) => break,
            Ok(Input::Empty) => {}
            Err(message) => eprintln!("{}", message),
        }
    }

    let config = session.shutdown().await?;
    tracing::info!("Last directory: {:?}", config.last_directory);
    printer.await?;
    Ok(())
}
