//! Console session for native builds.
//!
//! Pasted lines accumulate in the link input, and lines starting with `:`
//! are commands that map onto controller messages:
//!
//! ```text
//! :load                 load the pasted links
//! :label <id> [record]  toggle a label on the current image or a record
//! :next                 commit the current image and its labels
//! :export               write the CSV to the export folder
//! :list                 show records and their labels
//! :clear                empty the link input
//! :quit                 leave the session
//! ```

use std::io::{BufRead, Write};
use std::time::{Duration, Instant};

use crate::app::{ImageStatus, SnapCheckApp};
use crate::config::AppConfig;
use crate::download::{Downloader, FolderDownloader};
use crate::error::SnapCheckError;
use crate::format::describe_labels;
use crate::input::LoadPolicy;
use crate::loader::ImageLoader;
use crate::loader::native::NativeImageLoader;
use crate::message::{LabelTarget, Message};
use crate::model::{Label, RecordId};

/// How long `:load` waits for outcomes before handing control back.
const LOAD_WAIT: Duration = Duration::from_secs(30);
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// A console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Load,
    Label(Label, Option<RecordId>),
    Next,
    Export,
    List,
    Clear,
    Help,
    Quit,
    /// Link text to add to the input
    Paste(String),
}

impl Command {
    /// Parse one console line.
    pub fn parse(line: &str) -> Result<Self, String> {
        let trimmed = line.trim();
        let Some(command) = trimmed.strip_prefix(':') else {
            return Ok(Command::Paste(line.to_string()));
        };

        let mut words = command.split_whitespace();
        match words.next() {
            Some("load") => Ok(Command::Load),
            Some("label") => {
                let id = words.next().ok_or("usage: :label <id> [record]")?;
                let label = Label::from_id(id).map_err(|e| e.to_string())?;
                let record = match words.next() {
                    Some(n) => Some(n.parse().map_err(|_| format!("Invalid record id: {}", n))?),
                    None => None,
                };
                Ok(Command::Label(label, record))
            }
            Some("next") => Ok(Command::Next),
            Some("export") => Ok(Command::Export),
            Some("list") => Ok(Command::List),
            Some("clear") => Ok(Command::Clear),
            Some("help") => Ok(Command::Help),
            Some("quit") | Some("q") => Ok(Command::Quit),
            Some(other) => Err(format!("Unknown command: :{}", other)),
            None => Err("Empty command".to_string()),
        }
    }
}

/// Run an interactive session on stdin/stdout until `:quit` or end of input.
pub fn run(config: AppConfig) -> Result<(), SnapCheckError> {
    let loader =
        NativeImageLoader::spawn().map_err(|e| SnapCheckError::Io(std::io::Error::other(e)))?;
    let downloader = FolderDownloader::new(config.resolved_export_folder());

    let mut stdout = std::io::stdout();
    writeln!(
        stdout,
        "SnapCheck ({} mode). Paste links, then :load. Exports go to {}. :help for commands.",
        config.load_policy.name(),
        downloader.folder().display()
    )?;

    run_with(
        config,
        std::io::stdin().lock(),
        &mut stdout,
        Box::new(loader),
        Box::new(downloader),
    )
}

/// Run a session reading commands from `reader` and printing to `out`.
pub fn run_with(
    config: AppConfig,
    reader: impl BufRead,
    out: &mut impl Write,
    loader: Box<dyn ImageLoader>,
    downloader: Box<dyn Downloader>,
) -> Result<(), SnapCheckError> {
    let mut app = SnapCheckApp::new(config, loader, downloader);

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                writeln!(out, "{}", e)?;
                continue;
            }
        };

        let is_help = command == Command::Help;
        let is_list = command == Command::List;

        match command {
            Command::Quit => break,
            Command::Paste(text) => {
                let mut input = app.input().to_string();
                if !input.is_empty() {
                    input.push('\n');
                }
                input.push_str(&text);
                app.update(Message::InputChanged(input));
            }
            Command::Load => {
                app.update(Message::LoadRequested);
                wait_for_loads(&mut app);
            }
            Command::Label(label, record) => {
                let target = record.map_or(LabelTarget::Current, LabelTarget::Record);
                app.update(Message::LabelToggled(target, label));
            }
            Command::Next => app.update(Message::Next),
            Command::Export => app.update(Message::ExportRequested),
            Command::Clear => app.update(Message::InputChanged(String::new())),
            Command::List | Command::Help => {}
        }

        if is_help {
            writeln!(out, "{}", HELP)?;
        } else {
            print_state(out, &app, is_list)?;
        }
        if let Some(error) = app.error() {
            writeln!(out, "! {}", error)?;
            app.update(Message::DismissError);
        }
    }

    log::info!("Session ended with {} record(s)", app.store().len());
    Ok(())
}

const HELP: &str = ":load | :label <blurry|cropped|spliced> [record] | :next | :export | :list | :clear | :quit";

/// Poll until nothing is loading any more, or the wait runs out.
fn wait_for_loads(app: &mut SnapCheckApp) {
    let started = Instant::now();
    while started.elapsed() < LOAD_WAIT {
        app.tick();
        if !app.is_loading() {
            return;
        }
        std::thread::sleep(POLL_INTERVAL);
    }
    log::warn!("Gave up waiting for image loads after {:?}", LOAD_WAIT);
}

fn print_state(out: &mut impl Write, app: &SnapCheckApp, list_records: bool) -> std::io::Result<()> {
    if let Some(current) = app.current() {
        let status = match &current.status {
            ImageStatus::Loading => "cargando...".to_string(),
            ImageStatus::Loaded { width, height } => format!("{}x{}", width, height),
            ImageStatus::Failed { message } => message.clone(),
        };
        writeln!(out, "Imagen: {} [{}]", current.reference, status)?;
        if !app.selection().is_empty() {
            writeln!(
                out,
                "Clasificaciones seleccionadas: {}",
                describe_labels(app.selection().in_selection_order())
            )?;
        }
    }

    let queued = app.input().lines().filter(|l| !l.trim().is_empty()).count();
    if queued > 0 && app.config().load_policy == LoadPolicy::AppendOne {
        writeln!(out, "Links en la entrada: {}", queued)?;
    }

    if list_records || app.config().load_policy == LoadPolicy::ReplaceAll {
        for record in app.store().all() {
            let labels = describe_labels(record.labels().in_vocabulary_order());
            let failed = matches!(app.record_status(record.id()), Some(ImageStatus::Failed { .. }));
            writeln!(
                out,
                "  #{} {}{} {}",
                record.id(),
                record.reference(),
                if failed { " (error)" } else { "" },
                if labels.is_empty() { "-".to_string() } else { labels }
            )?;
        }
    }
    writeln!(out, "Imágenes procesadas: {}", app.store().len())?;
    if let Some(name) = app.last_export() {
        writeln!(out, "Última exportación: {}", name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn write_png(dir: &Path, name: &str, size: u32) -> String {
        let path = dir.join(name);
        image::RgbImage::new(size, size).save(&path).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn session(config: AppConfig, script: &str, export_dir: &Path) -> Vec<String> {
        let mut out = Vec::new();
        run_with(
            config,
            script.as_bytes(),
            &mut out,
            Box::new(NativeImageLoader::spawn().unwrap()),
            Box::new(FolderDownloader::new(export_dir)),
        )
        .unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    fn exported_csv(export_dir: &Path) -> String {
        let files: Vec<_> = std::fs::read_dir(export_dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(files.len(), 1, "expected one export, found {:?}", files);
        let name = files[0].file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("snapcheck_validacion_") && name.ends_with(".csv"));
        std::fs::read_to_string(&files[0]).unwrap()
    }

    #[test]
    fn test_single_image_session() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_png(dir.path(), "first.png", 1);
        let second = write_png(dir.path(), "second.png", 2);
        let exports = dir.path().join("exports");

        let script = format!(
            ":next\n{first}\n{second}\n:load\n:label blurry\n:label spliced\n:next\n\
             :load\n:next\n:list\n:export\n:bogus\n:quit\n:next\n"
        );
        let lines = session(AppConfig::new(), &script, &exports);

        // Error printed once after the state, then dismissed
        assert_eq!(lines[0], "Imágenes procesadas: 0");
        assert_eq!(lines[1], "! Por favor, carga una imagen primero");
        let errors = lines.iter().filter(|l| l.starts_with("! ")).count();
        assert_eq!(errors, 1, "{:#?}", lines);

        // Pasted lines accumulate in the input
        assert!(lines.contains(&"Links en la entrada: 1".to_string()));
        assert!(lines.contains(&"Links en la entrada: 2".to_string()));

        // Only the first link loads; the second waits for the next round
        assert!(lines.contains(&format!("Imagen: {} [1x1]", first)));
        assert!(lines.contains(&"Clasificaciones seleccionadas: Borrosa ligeramente, Mal empalmada".to_string()));
        assert!(lines.contains(&"Imágenes procesadas: 1".to_string()));
        assert!(lines.contains(&format!("Imagen: {} [2x2]", second)));

        assert!(lines.contains(&format!("  #0 {} Borrosa ligeramente, Mal empalmada", first)));
        assert!(lines.contains(&format!("  #1 {} -", second)));
        assert!(lines.iter().any(|l| l.starts_with("Última exportación: snapcheck_validacion_")));
        assert_eq!(lines.last().unwrap(), "Unknown command: :bogus");

        assert_eq!(
            exported_csv(&exports),
            format!(
                "Link,Clasificación\n\"{}\",\"Borrosa ligeramente; Mal empalmada\"\n\"{}\",\"Sin clasificación\"\n",
                first, second
            )
        );
    }

    #[test]
    fn test_batch_session() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_png(dir.path(), "good.png", 1);
        let missing = dir.path().join("missing.png").to_string_lossy().into_owned();
        let exports = dir.path().join("exports");

        let mut config = AppConfig::new();
        config.load_policy = LoadPolicy::ReplaceAll;
        let script = format!("{missing}\n{good}\n:load\n:label cropped 1\n:export\n");
        let lines = session(config, &script, &exports);

        assert!(lines.contains(&format!("  #0 {} (error) -", missing)));
        assert!(lines.contains(&format!("  #1 {} -", good)));
        assert!(lines.contains(&format!("  #1 {} Mal recortada", good)));
        assert!(!lines.iter().any(|l| l.starts_with("! ")), "{:#?}", lines);

        assert_eq!(
            exported_csv(&exports),
            format!(
                "Link,Clasificación\n\"{}\",\"Sin clasificación\"\n\"{}\",\"Mal recortada\"\n",
                missing, good
            )
        );
    }

    #[test]
    fn test_empty_export_in_session() {
        let dir = tempfile::tempdir().unwrap();
        let lines = session(AppConfig::new(), ":export\n:help\n", dir.path());
        assert_eq!(
            lines,
            vec![
                "Imágenes procesadas: 0".to_string(),
                "! No hay datos para exportar".to_string(),
                HELP.to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_paste() {
        assert_eq!(
            Command::parse("  http://a/1.png").unwrap(),
            Command::Paste("  http://a/1.png".to_string())
        );
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse(":load").unwrap(), Command::Load);
        assert_eq!(Command::parse(" :next ").unwrap(), Command::Next);
        assert_eq!(Command::parse(":q").unwrap(), Command::Quit);
        assert_eq!(
            Command::parse(":label blurry").unwrap(),
            Command::Label(Label::Blurry, None)
        );
        assert_eq!(
            Command::parse(":label spliced 4").unwrap(),
            Command::Label(Label::Spliced, Some(4))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse(":label").is_err());
        assert!(Command::parse(":label shiny").is_err());
        assert!(Command::parse(":label blurry x").is_err());
        assert!(Command::parse(":dance").is_err());
        assert!(Command::parse(":").is_err());
    }
}
