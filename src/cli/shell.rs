use std::{
    borrow::Cow,
    io::{self, BufRead},
};

use dialoguer::{theme::ColorfulTheme, Confirm};
use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
    Context as ReadlineContext, Editor, Helper,
};
use shell_words::split;

use super::commands::ShellContext;
use super::output;
use super::{CliError, CliMode, CommandError, LoopControl};

const SCRIPT_ENV: &str = "BANK_LEDGER_CLI_SCRIPT";

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };

    let mut context = ShellContext::new(mode)?;

    match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context),
    }
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let mut editor = Editor::<CommandHelper, DefaultHistory>::new()?;
    editor.set_helper(Some(CommandHelper::new(context.command_names())));
    output::info("Type `help` to list commands.");

    while context.running {
        match editor.readline(&context.prompt()) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                editor.add_history_entry(trimmed).ok();
                if let Err(err) = handle_line(context, trimmed) {
                    context.report_error(err);
                }
            }
            Err(ReadlineError::Interrupted) => {
                if confirm_exit(context)? {
                    break;
                }
            }
            Err(ReadlineError::Eof) => {
                output::info("Exiting shell.");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        if !context.running {
            break;
        }
        let line = line?;
        if let Err(err) = handle_line(context, &line) {
            context.report_error(err);
        }
    }
    Ok(())
}

fn confirm_exit(context: &ShellContext) -> Result<bool, CliError> {
    if context.mode == CliMode::Script {
        return Ok(true);
    }
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Exit shell? The ledger is not saved.")
        .default(false)
        .interact()?)
}

fn handle_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CommandError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(LoopControl::Continue);
    }
    let tokens = match split(trimmed) {
        Ok(tokens) => tokens,
        Err(err) => {
            output::warning(err);
            return Ok(LoopControl::Continue);
        }
    };
    let Some((command, rest)) = tokens.split_first() else {
        return Ok(LoopControl::Continue);
    };
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();

    let control = context.dispatch(&command.to_lowercase(), &args)?;
    if control == LoopControl::Exit {
        context.running = false;
    }
    Ok(control)
}

struct CommandHelper {
    commands: Vec<String>,
}

impl CommandHelper {
    fn new(names: Vec<&'static str>) -> Self {
        let mut commands: Vec<String> = names.into_iter().map(str::to_string).collect();
        commands.sort();
        commands.dedup();
        Self { commands }
    }
}

impl Helper for CommandHelper {}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        // Only the first word is completed.
        if prefix.trim_start().contains(char::is_whitespace) {
            return Ok((pos, Vec::new()));
        }
        let start = prefix.len() - prefix.trim_start().len();
        let needle = prefix[start..].to_ascii_lowercase();
        let candidates = self
            .commands
            .iter()
            .filter(|name| name.starts_with(&needle))
            .map(|name| Pair {
                display: name.clone(),
                replacement: name.clone(),
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;
}

impl Highlighter for CommandHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }
}

impl Validator for CommandHelper {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;

    #[test]
    fn quoted_descriptions_stay_together() {
        let mut context = ShellContext::with_config(CliMode::Script, LedgerConfig::default());
        handle_line(&mut context, "open fixed 100").unwrap();
        handle_line(&mut context, r#"DEPOSIT ACC-1001 25 "birthday gift""#).unwrap();

        let record = &context.ledger.all_transactions()[0];
        assert_eq!(record.description, "birthday gift");
    }

    #[test]
    fn exit_clears_running_flag() {
        let mut context = ShellContext::with_config(CliMode::Script, LedgerConfig::default());
        assert_eq!(handle_line(&mut context, "exit").unwrap(), LoopControl::Exit);
        assert!(!context.running);
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let mut context = ShellContext::with_config(CliMode::Script, LedgerConfig::default());
        assert_eq!(
            handle_line(&mut context, "  # setup").unwrap(),
            LoopControl::Continue
        );
        assert_eq!(handle_line(&mut context, "").unwrap(), LoopControl::Continue);
    }
}
