use crossterm::style::Stylize;
use reedline::{
    FileBackedHistory, Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus,
    Reedline, Signal,
};
use std::borrow::Cow;
use std::path::PathBuf;
use tabula::config::Config;
use tabula::shell::{Command, Outcome, Session};
use tabula::FunctionRegistry;
use tracing::warn;

mod table_display;

use table_display::{display_table, print_help};

const HISTORY_SIZE: usize = 500;

struct TabulaPrompt {
    commit: bool,
}

impl Prompt for TabulaPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        if self.commit {
            Cow::Borrowed("tabula*")
        } else {
            Cow::Borrowed("tabula")
        }
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, edit_mode: PromptEditMode) -> Cow<'_, str> {
        match edit_mode {
            PromptEditMode::Default | PromptEditMode::Emacs => "> ".into(),
            PromptEditMode::Vi(vi_mode) => match vi_mode {
                reedline::PromptViMode::Normal => "N> ".into(),
                reedline::PromptViMode::Insert => "I> ".into(),
            },
            PromptEditMode::Custom(str) => format!("{str}> ").into(),
        }
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("... ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!(
            "({}reverse search: {})",
            prefix, history_search.term
        ))
    }
}

fn history_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("tabula").join("history.txt"))
}

fn build_editor() -> Reedline {
    let editor = Reedline::create();
    let Some(path) = history_path() else {
        return editor;
    };
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!(target: "system", "No history: {}", e);
            return editor;
        }
    }
    match FileBackedHistory::with_file(HISTORY_SIZE, path) {
        Ok(history) => editor.with_history(Box::new(history)),
        Err(e) => {
            warn!(target: "system", "No history: {}", e);
            editor
        }
    }
}

fn generate_config() -> anyhow::Result<()> {
    let path = Config::get_config_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, Config::create_default_with_comments())?;
    println!("Configuration file created at: {}", path.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        let functions = FunctionRegistry::with_builtins();
        print_help(&functions.predicate_names(), &functions.setter_names());
        return Ok(());
    }
    if args.iter().any(|a| a == "--generate-config") {
        return generate_config();
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", format!("Config error, using defaults: {:#}", e).yellow());
            Config::default()
        }
    };
    tabula::logging::init_tracing(&config.logging.level);

    let mut session = Session::new(config);
    if let Some(file) = args.iter().find(|a| !a.starts_with("--")) {
        match session.execute(Command::Load(PathBuf::from(file))) {
            Ok(Outcome::Message(message)) => println!("{}", message.cyan()),
            Ok(_) => {}
            Err(e) => eprintln!("{}", format!("Error: {:#}", e).red()),
        }
    }

    println!("{}", "Type 'help' for commands, 'quit' to exit.".dark_grey());
    let mut line_editor = build_editor();

    loop {
        let prompt = TabulaPrompt {
            commit: session.commit_enabled(),
        };
        match line_editor.read_line(&prompt)? {
            Signal::Success(buffer) => {
                let trimmed = buffer.trim();
                if trimmed.is_empty() {
                    continue;
                }

                let outcome = trimmed
                    .parse::<Command>()
                    .and_then(|command| session.execute(command));
                match outcome {
                    Ok(Outcome::Table(table)) => display_table(&table),
                    Ok(Outcome::Text(text)) => println!("{}", text),
                    Ok(Outcome::Message(message)) => println!("{}", message.cyan()),
                    Ok(Outcome::Help { predicates, setters }) => {
                        print_help(&predicates, &setters)
                    }
                    Ok(Outcome::Quit) => break,
                    Err(e) => eprintln!("{}", format!("Error: {:#}", e).red()),
                }
            }
            Signal::CtrlD | Signal::CtrlC => {
                println!("\nGoodbye!");
                break;
            }
        }
    }

    Ok(())
}
