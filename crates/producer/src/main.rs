//! A terminal front end for the producer assistant, working on an
//! in-memory project.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use producer::core::AgentEvent;
use producer::core::settings::TomlSettings;
use producer::host::{MemoryProject, SampleLibrary};
use producer::ui::{Artifact, ChatView, ViewChange};
use producer::{Session, SessionBuilder};
use producer_openai_model::DEFAULT_BASE_URL;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

const BAR_CHAR: &str = "▎";

/// How many lines of a tool result are echoed.
const RESULT_PREVIEW_LINES: usize = 8;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Some(settings_path) = settings_path() else {
        eprintln!("set PRODUCER_SETTINGS or HOME to locate the settings file");
        return;
    };
    let store = match TomlSettings::open(&settings_path) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("{}: {err}", settings_path.display());
            return;
        }
    };

    let samples = env::var_os("PRODUCER_SAMPLES_DIR")
        .map(|dirs| SampleLibrary::new(env::split_paths(&dirs)))
        .unwrap_or_default();
    let project = MemoryProject::new().with_samples(samples);
    let base_url = env::var("PRODUCER_BASE_URL")
        .unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let session = SessionBuilder::with_base_url(base_url, project)
        .with_settings_store(store)
        .on_event(move |event| {
            event_tx.send(event.clone()).ok();
        })
        .build();

    println!(
        "{} {}",
        "🎹 Producer".bright_white().bold(),
        "type /quit to leave, Ctrl-C cancels a reply".dimmed()
    );
    if !session.settings().await.is_configured() {
        println!("{}", "No API key yet. Set one with /key <key>.".yellow());
    }

    let mut view = ChatView::new();
    let mut lines = io::BufReader::new(io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line(&mut lines).await else {
            break;
        };
        let line = line.trim();
        let (command, argument) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(command, arg)| (command, arg.trim()));

        match command {
            "" => {}
            "/quit" => break,
            "/cancel" => session.cancel(),
            "/clear" => {
                session.clear_history();
                view.clear();
                println!("{}", "History cleared.".dimmed());
            }
            "/key" if !argument.is_empty() => {
                report(session.set_api_key(argument).await, "API key saved.");
            }
            "/model" if !argument.is_empty() => {
                let saved = format!("Using {argument}.");
                report(session.set_model(argument).await, &saved);
            }
            "/models" => list_models(&session).await,
            _ if command.starts_with('/') => {
                println!(
                    "{}",
                    "Commands: /key <key>, /model <id>, /models, /clear, \
                     /cancel, /quit"
                        .yellow()
                );
            }
            _ => {
                view.push_user_message(line);
                session.send_message(line);
                if !run_turn(&session, &mut view, &mut event_rx).await {
                    break;
                }
            }
        }
    }
}

/// Renders events until the turn ends. Returns `false` if the session
/// went away.
async fn run_turn(
    session: &Session,
    view: &mut ChatView,
    event_rx: &mut mpsc::UnboundedReceiver<AgentEvent>,
) -> bool {
    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let mut renderer = Renderer::default();
    let mut progress_bar: Option<ProgressBar> = None;
    let mut started = false;

    loop {
        // A spinner would overwrite text that is still streaming.
        if !renderer.line_open {
            progress_bar
                .get_or_insert_with(|| {
                    let progress_bar = ProgressBar::new_spinner();
                    progress_bar.set_style(progress_style.clone());
                    progress_bar.set_message("🤔 Thinking...");
                    progress_bar
                })
                .inc(1);
        }

        let event = select! {
            event = event_rx.recv() => {
                let Some(event) = event else {
                    return false;
                };
                event
            },
            _ = tokio::signal::ctrl_c() => {
                debug!("cancelling on Ctrl-C");
                session.cancel();
                continue;
            },
            _ = sleep(Duration::from_millis(100)) => {
                continue;
            }
        };

        if let Some(progress_bar) = progress_bar.take() {
            progress_bar.finish_and_clear();
        }

        let changes = view.apply(&event);
        renderer.render(view, &changes);
        match event {
            AgentEvent::ProcessingStarted => started = true,
            AgentEvent::ProcessingFinished => break,
            // Refusals arrive without a turn around them.
            AgentEvent::Error(_) if !started => break,
            _ => {}
        }
    }

    renderer.close_line();
    true
}

/// Prints artifacts as they appear. A terminal cannot rewrite earlier
/// output, so streamed text is printed as it grows.
#[derive(Default)]
struct Renderer {
    /// The streaming assistant artifact and how many bytes of it are
    /// already printed.
    streaming: Option<(usize, usize)>,
    line_open: bool,
}

impl Renderer {
    fn render(&mut self, view: &ChatView, changes: &[ViewChange]) {
        for change in changes {
            let (index, inserted) = match *change {
                ViewChange::Inserted(index) => (index, true),
                ViewChange::Updated(index) => (index, false),
                _ => continue,
            };
            if let Some(artifact) = view.artifacts().get(index) {
                self.render_artifact(index, artifact, inserted);
            }
        }
        std::io::stdout().flush().ok();
    }

    fn render_artifact(
        &mut self,
        index: usize,
        artifact: &Artifact,
        inserted: bool,
    ) {
        let bar = BAR_CHAR.bright_yellow();
        match artifact {
            Artifact::Assistant(text) => {
                let printed = match self.streaming {
                    Some((streaming, printed)) if streaming == index => {
                        printed
                    }
                    _ => 0,
                };
                if inserted || !self.line_open {
                    self.close_line();
                    print!("{}🤖 ", BAR_CHAR.bright_cyan());
                    self.line_open = true;
                }
                let fresh = text.get(printed..).unwrap_or_default();
                print!("{}", fresh.bright_white());
                self.streaming = Some((index, text.len()));
            }
            Artifact::Thinking(_) if inserted => {
                self.close_line();
                let thinking = "Thinking...".dimmed();
                println!("{}💭 {thinking}", BAR_CHAR.dimmed());
            }
            Artifact::ToolCall {
                name, arguments, ..
            } if inserted => {
                self.close_line();
                let name = name.bright_white();
                let name = name.bold();
                println!("{bar}🔧 {name} {}", arguments.dimmed());
            }
            Artifact::ToolCall {
                result: Some(result),
                ..
            } => {
                self.close_line();
                let lines = result.lines().collect::<Vec<_>>();
                for line in lines.iter().take(RESULT_PREVIEW_LINES) {
                    println!("{bar}   {}", line.dimmed());
                }
                if lines.len() > RESULT_PREVIEW_LINES {
                    println!("{bar}   {}", "...".dimmed());
                }
            }
            Artifact::Error(error) => {
                self.close_line();
                println!("{}❌ {}", BAR_CHAR.bright_red(), error.red());
            }
            // User messages are already on screen, thinking updates are
            // not echoed.
            _ => {}
        }
    }

    fn close_line(&mut self) {
        if self.line_open {
            println!();
            self.line_open = false;
        }
    }
}

async fn list_models(session: &Session) {
    let current = session.settings().await.model;
    match session.available_models().await {
        Ok(models) => {
            for model in models {
                let marker = if model.id == current { "*" } else { " " };
                println!("{marker} {} {}", model.id, model.name.dimmed());
            }
        }
        Err(err) => {
            println!("{}", format!("Cannot list models: {err}").red());
        }
    }
}

fn report<E: std::fmt::Display>(result: Result<(), E>, saved: &str) {
    match result {
        Ok(()) => println!("{}", saved.dimmed()),
        Err(err) => println!("{}", err.to_string().red()),
    }
}

fn settings_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os("PRODUCER_SETTINGS") {
        return Some(path.into());
    }
    let home = env::var_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("producer")
            .join("settings.toml"),
    )
}

async fn read_line<R>(lines: &mut Lines<R>) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    match lines.next_line().await {
        Ok(line) => line,
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_pasted_lines() {
        let input = b"/clear\nhello\n\nbye";
        let mut lines = io::BufReader::new(&input[..]).lines();
        assert_eq!(read_line(&mut lines).await.as_deref(), Some("/clear"));
        assert_eq!(read_line(&mut lines).await.as_deref(), Some("hello"));
        assert_eq!(read_line(&mut lines).await.as_deref(), Some(""));
        assert_eq!(read_line(&mut lines).await.as_deref(), Some("bye"));
        assert_eq!(read_line(&mut lines).await, None);
    }
}
