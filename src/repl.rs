// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Interactive session for inspecting a bundle's modules.

use omelette_loader::{Bundle, LoaderError, Value};
use owo_colors::OwoColorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Config, Editor, Helper};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// REPL configuration constants
const HISTORY_FILE: &str = ".omelette_history";
const MAX_HISTORY_SIZE: usize = 1000;

/// REPL commands that can be executed with a dot prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Exit,
    Clear,
    Version,
    Load,
    Require,
    Latest,
    Path,
    Modules,
}

impl ReplCommand {
    /// Parse a REPL command from input string
    pub fn parse(input: &str) -> Option<(Self, Option<&str>)> {
        let input = input.trim();
        let rest = input.strip_prefix('.')?;

        let mut parts = rest.splitn(2, char::is_whitespace);
        let cmd = parts.next()?.to_lowercase();
        let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

        match cmd.as_str() {
            "help" | "h" | "?" => Some((ReplCommand::Help, arg)),
            "exit" | "quit" | "q" => Some((ReplCommand::Exit, arg)),
            "clear" | "cls" => Some((ReplCommand::Clear, arg)),
            "version" | "v" => Some((ReplCommand::Version, arg)),
            "load" | "l" => Some((ReplCommand::Load, arg)),
            "require" | "r" => Some((ReplCommand::Require, arg)),
            "latest" => Some((ReplCommand::Latest, arg)),
            "path" | "p" => Some((ReplCommand::Path, arg)),
            "modules" | "ls" => Some((ReplCommand::Modules, arg)),
            _ => None,
        }
    }

    /// Get all available commands for help/completion
    pub fn all_commands() -> &'static [(&'static str, &'static str)] {
        &[
            (".require <name>", "Require a module and print its exports"),
            (".latest <owner~repo>", "Require the highest version of a package"),
            (".path <owner~repo>", "Print the key .latest would resolve"),
            (".modules", "List registered modules"),
            (".load <manifest>", "Replace the bundle with another manifest"),
            (".help", "Show this help message"),
            (".version", "Show version information"),
            (".clear", "Clear the screen"),
            (".exit", "Exit the REPL"),
        ]
    }
}

/// Completion and hints over registered module names and REPL commands
#[derive(Default)]
struct OmeletteHelper {
    words: Vec<String>,
}

impl OmeletteHelper {
    fn new(modules: Vec<String>) -> Self {
        let mut helper = Self::default();
        helper.set_modules(modules);
        helper
    }

    fn set_modules(&mut self, modules: Vec<String>) {
        self.words = [
            ".require", ".latest", ".path", ".modules", ".load", ".help", ".version", ".clear",
            ".exit",
        ]
        .into_iter()
        .map(String::from)
        .chain(modules)
        .collect();
    }
}

/// Start of the word under the cursor. Module names may contain `~ @ - . /`.
fn word_start(line: &str, pos: usize) -> usize {
    line[..pos]
        .char_indices()
        .rfind(|(_, c)| c.is_whitespace())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0)
}

impl Completer for OmeletteHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = word_start(line, pos);
        let word = &line[start..pos];
        if word.is_empty() {
            return Ok((pos, vec![]));
        }

        let matches: Vec<Pair> = self
            .words
            .iter()
            .filter(|w| w.starts_with(word))
            .map(|w| Pair {
                display: w.clone(),
                replacement: w[word.len()..].to_string(),
            })
            .collect();

        Ok((pos, matches))
    }
}

impl Hinter for OmeletteHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        if pos < line.len() {
            return None;
        }

        let word = &line[word_start(line, pos)..];
        if word.len() < 2 {
            return None;
        }

        self.words
            .iter()
            .find(|w| w.starts_with(word) && w.len() > word.len())
            .map(|w| w[word.len()..].to_string().dimmed().to_string())
    }
}

impl Highlighter for OmeletteHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Owned(
            line.split_inclusive(char::is_whitespace)
                .map(highlight_word)
                .collect(),
        )
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

/// Commands magenta, `owner~repo@version` split into its parts
fn highlight_word(word: &str) -> String {
    if word.starts_with('.') {
        return word.magenta().bold().to_string();
    }

    let (scoped, version) = match word.split_once('@') {
        Some((scoped, version)) => (scoped, Some(version)),
        None => (word, None),
    };
    let mut out = match scoped.split_once('~') {
        Some((owner, repo)) => format!("{}{}{}", owner.cyan(), "~".dimmed(), repo),
        None => scoped.to_string(),
    };
    if let Some(version) = version {
        out.push_str(&format!("{}{}", "@".dimmed(), version.yellow()));
    }
    out
}

impl Validator for OmeletteHelper {}

impl Helper for OmeletteHelper {}

/// The interactive REPL over a loaded bundle
pub struct Repl {
    bundle: Bundle,
    editor: Editor<OmeletteHelper, DefaultHistory>,
    history_path: PathBuf,
}

impl Repl {
    /// Create a new REPL instance over `manifest`, or the default manifest
    pub fn new(manifest: Option<&Path>) -> anyhow::Result<Self> {
        let bundle = Bundle::open(manifest)?;

        let config = Config::builder()
            .history_ignore_dups(true)?
            .history_ignore_space(true)
            .max_history_size(MAX_HISTORY_SIZE)?
            .auto_add_history(true)
            .build();

        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(OmeletteHelper::new(bundle.loader().modules())));

        let history_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("omelette")
            .join(HISTORY_FILE);

        // History is best-effort
        if let Some(parent) = history_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = editor.load_history(&history_path);

        Ok(Self {
            bundle,
            editor,
            history_path,
        })
    }

    /// Run the REPL main loop
    pub fn run(&mut self) -> rustyline::Result<()> {
        self.print_banner();

        loop {
            let prompt = format!("{} ", "omelette>".bright_green().bold());

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();

                    if trimmed.is_empty() {
                        continue;
                    }

                    match ReplCommand::parse(trimmed) {
                        Some((cmd, arg)) => match self.execute_command(cmd, arg) {
                            CommandResult::Continue => continue,
                            CommandResult::Exit => break,
                        },
                        None if trimmed.starts_with('.') => {
                            eprintln!(
                                "{}: unknown command '{}'; try {}",
                                "Error".red().bold(),
                                trimmed.cyan(),
                                ".help".cyan()
                            );
                        }
                        // A bare name is a require
                        None => self.require(trimmed),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C".dimmed());
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "^D".dimmed());
                    break;
                }
                Err(err) => {
                    eprintln!("{}: {:?}", "Error".red().bold(), err);
                    break;
                }
            }
        }

        let _ = self.editor.save_history(&self.history_path);
        Ok(())
    }

    fn print_banner(&self) {
        println!();
        println!(
            "  {} {} {}",
            "omelette".bright_cyan().bold(),
            "v".dimmed(),
            env!("CARGO_PKG_VERSION").bright_yellow()
        );
        println!(
            "  {} modules registered, entry {}",
            self.bundle.loader().len().to_string().yellow(),
            self.bundle.entry().cyan()
        );
        println!(
            "  {} {} {}",
            "Type".dimmed(),
            ".help".cyan(),
            "for available commands".dimmed()
        );
        println!();
    }

    fn execute_command(&mut self, cmd: ReplCommand, arg: Option<&str>) -> CommandResult {
        match (cmd, arg) {
            (ReplCommand::Help, _) => self.print_help(),
            (ReplCommand::Exit, _) => return CommandResult::Exit,
            (ReplCommand::Clear, _) => print!("\x1B[2J\x1B[H"),
            (ReplCommand::Version, _) => {
                println!("{}: {}", "omelette".bright_cyan().bold(), env!("CARGO_PKG_VERSION").yellow());
            }
            (ReplCommand::Modules, _) => self.print_modules(),
            (ReplCommand::Load, Some(path)) => self.load(Path::new(path)),
            (ReplCommand::Require, Some(name)) => self.require(name),
            (ReplCommand::Latest, Some(name)) => match self.bundle.loader().latest(name) {
                Ok(exports) => println!("{}", format_value(&exports.borrow())),
                Err(e) => print_error(&e),
            },
            (ReplCommand::Path, Some(name)) => match self.bundle.loader().latest_path(name) {
                Ok(key) => println!("{}", highlight_word(&key)),
                Err(e) => print_error(&e),
            },
            (ReplCommand::Load | ReplCommand::Require | ReplCommand::Latest | ReplCommand::Path, None) => {
                eprintln!(
                    "{}: {}",
                    "Error".red().bold(),
                    "missing argument, see .help".dimmed()
                );
            }
        }
        CommandResult::Continue
    }

    fn require(&self, name: &str) {
        match self.bundle.loader().require(name) {
            Ok(exports) => println!("{}", format_value(&exports.borrow())),
            Err(e) => print_error(&e),
        }
    }

    fn load(&mut self, path: &Path) {
        match Bundle::load(path) {
            Ok(bundle) => {
                println!(
                    "{} {} modules from {}",
                    "loaded".green(),
                    bundle.loader().len(),
                    path.display()
                );
                if let Some(helper) = self.editor.helper_mut() {
                    helper.set_modules(bundle.loader().modules());
                }
                self.bundle = bundle;
            }
            Err(e) => print_error(&e),
        }
    }

    fn print_modules(&self) {
        let loader = self.bundle.loader();
        for key in loader.modules() {
            let loaded = loader.record(&key).is_some_and(|r| r.is_resolved());
            let marker = if loaded {
                "●".green().to_string()
            } else {
                "○".dimmed().to_string()
            };
            println!("  {} {}", marker, highlight_word(&key));
        }
    }

    fn print_help(&self) {
        println!();
        println!("{}", "REPL Commands:".white().bold());
        println!();

        for (cmd, desc) in ReplCommand::all_commands() {
            println!("  {:24} {}", cmd.cyan(), desc.dimmed());
        }

        println!();
        println!("  {}", "A line without a leading '.' is required by name.".dimmed());
        println!();
    }
}

/// Result of executing a REPL command
enum CommandResult {
    Continue,
    Exit,
}

/// Format exports for display with syntax coloring
fn format_value(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".blue().dimmed().to_string(),
        Value::Null => "null".blue().to_string(),
        Value::Boolean(b) => b.to_string().yellow().to_string(),
        Value::Number(n) => n.to_string().yellow().to_string(),
        Value::String(s) => format!("'{}'", s).green().to_string(),
        Value::Function(_) => value.to_string().magenta().to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string().cyan().to_string(),
    }
}

/// Print a loader error
fn print_error(error: &LoaderError) {
    eprintln!("{}: {}", "Error".red().bold(), error);
}
