use std::sync::Arc;

use strsim::levenshtein;

use crate::config::{ConfigManager, LedgerConfig};
use crate::ledger::{AccountCategory, Customer, Ledger, Receipt};
use crate::utils::build_info;

use super::output::{self, ConsoleSink};
use super::{CliError, CliMode, CommandError, LoopControl};

pub(crate) struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub summary: &'static str,
}

pub(crate) const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "customer",
        usage: "customer <id> <name> [email]",
        summary: "Register a customer who receives account notifications",
    },
    CommandSpec {
        name: "customers",
        usage: "customers",
        summary: "List registered customers",
    },
    CommandSpec {
        name: "open",
        usage: "open <savings|checking|fixed> <initial-balance> [customer]",
        summary: "Open an account, optionally subscribing a customer",
    },
    CommandSpec {
        name: "deposit",
        usage: "deposit <account> <amount> [description]",
        summary: "Deposit funds into an account",
    },
    CommandSpec {
        name: "withdraw",
        usage: "withdraw <account> <amount> [description]",
        summary: "Withdraw funds from an account",
    },
    CommandSpec {
        name: "transfer",
        usage: "transfer <from> <to> <amount> [description]",
        summary: "Move funds between two accounts",
    },
    CommandSpec {
        name: "undo",
        usage: "undo",
        summary: "Reverse the most recent deposit, withdrawal or transfer",
    },
    CommandSpec {
        name: "subscribe",
        usage: "subscribe <account> <customer>",
        summary: "Send an account's notifications to a customer",
    },
    CommandSpec {
        name: "unsubscribe",
        usage: "unsubscribe <account> <customer>",
        summary: "Stop sending an account's notifications to a customer",
    },
    CommandSpec {
        name: "accounts",
        usage: "accounts",
        summary: "List accounts with balances and interest rates",
    },
    CommandSpec {
        name: "transactions",
        usage: "transactions [count|all]",
        summary: "Show the most recent transactions, newest first",
    },
    CommandSpec {
        name: "summary",
        usage: "summary",
        summary: "Show balances grouped by account category",
    },
    CommandSpec {
        name: "interest",
        usage: "interest <account> [years]",
        summary: "Compute simple interest due on an account",
    },
    CommandSpec {
        name: "history",
        usage: "history",
        summary: "List undoable commands, oldest first",
    },
    CommandSpec {
        name: "version",
        usage: "version",
        summary: "Show build information",
    },
    CommandSpec {
        name: "help",
        usage: "help [command]",
        summary: "Show available commands",
    },
    CommandSpec {
        name: "exit",
        usage: "exit",
        summary: "Leave the shell",
    },
];

/// State shared by every command of one shell session.
pub struct ShellContext {
    pub mode: CliMode,
    pub running: bool,
    pub ledger: Ledger,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let config = ConfigManager::new().load()?;
        Ok(Self::with_config(mode, config))
    }

    pub fn with_config(mode: CliMode, config: LedgerConfig) -> Self {
        Self {
            mode,
            running: true,
            ledger: Ledger::with_config(config),
        }
    }

    pub fn prompt(&self) -> String {
        format!("bank [{} accounts]> ", self.ledger.accounts().len())
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        COMMANDS.iter().map(|entry| entry.name).collect()
    }

    pub fn dispatch(&mut self, command: &str, args: &[&str]) -> Result<LoopControl, CommandError> {
        match command {
            "customer" => self.cmd_customer(args),
            "customers" => self.cmd_customers(),
            "open" => self.cmd_open(args),
            "deposit" => self.cmd_deposit(args),
            "withdraw" => self.cmd_withdraw(args),
            "transfer" => self.cmd_transfer(args),
            "undo" => self.cmd_undo(),
            "subscribe" => self.cmd_subscribe(args),
            "unsubscribe" => self.cmd_unsubscribe(args),
            "accounts" => self.cmd_accounts(),
            "transactions" => self.cmd_transactions(args),
            "summary" => self.cmd_summary(),
            "interest" => self.cmd_interest(args),
            "history" => self.cmd_history(),
            "version" => {
                output::info(build_info::current().summary());
                Ok(LoopControl::Continue)
            }
            "help" => self.cmd_help(args),
            "exit" | "quit" => Ok(LoopControl::Exit),
            other => Err(CommandError::UnknownCommand {
                name: other.to_string(),
                suggestion: suggest(other),
            }),
        }
    }

    pub fn report_error(&self, err: CommandError) {
        match err {
            CommandError::InvalidArguments { message, usage } => {
                output::error(message);
                output::hint(format!("usage: {usage}"));
            }
            CommandError::UnknownCommand { name, suggestion } => {
                output::error(format!("Unknown command `{name}`"));
                match suggestion {
                    Some(candidate) => output::hint(format!("did you mean `{candidate}`?")),
                    None => output::hint("Use `help` to list commands."),
                }
            }
            CommandError::Ledger(err) => output::error(err),
        }
    }

    fn cmd_customer(&mut self, args: &[&str]) -> Result<LoopControl, CommandError> {
        let [id, name, rest @ ..] = args else {
            return Err(invalid("customer", "customer id and name are required"));
        };
        let mut customer = Customer::new(*id, *name);
        if let Some(email) = rest.first() {
            customer = customer.with_email(*email);
        }
        let sink = Arc::new(ConsoleSink::new(*name));
        if self.ledger.register_customer(customer, sink) {
            output::success(format!("Registered customer {id} ({name})"));
        } else {
            output::warning(format!("Customer {id} is already registered"));
        }
        Ok(LoopControl::Continue)
    }

    fn cmd_customers(&self) -> Result<LoopControl, CommandError> {
        let rows: Vec<Vec<String>> = self
            .ledger
            .customers()
            .map(|customer| {
                vec![
                    customer.id.clone(),
                    customer.name.clone(),
                    customer.email.clone().unwrap_or_default(),
                ]
            })
            .collect();
        if rows.is_empty() {
            output::info("No customers registered.");
        } else {
            output::table(&["ID", "NAME", "EMAIL"], &rows);
        }
        Ok(LoopControl::Continue)
    }

    fn cmd_open(&mut self, args: &[&str]) -> Result<LoopControl, CommandError> {
        let [category, initial, rest @ ..] = args else {
            return Err(invalid("open", "category and initial balance are required"));
        };
        let category = category
            .parse::<AccountCategory>()
            .map_err(|message| invalid("open", message))?;
        let initial = parse_amount("open", initial)?;
        let snapshot = self
            .ledger
            .open_account(category, initial, rest.first().copied())?;
        output::success(format!(
            "Opened {} account {} with balance {}",
            snapshot.category,
            snapshot.id,
            self.money(snapshot.balance)
        ));
        Ok(LoopControl::Continue)
    }

    fn cmd_deposit(&mut self, args: &[&str]) -> Result<LoopControl, CommandError> {
        let [account, amount, rest @ ..] = args else {
            return Err(invalid("deposit", "account and amount are required"));
        };
        let amount = parse_amount("deposit", amount)?;
        let receipt = self.ledger.deposit(account, amount, &rest.join(" "))?;
        self.print_receipt(&receipt);
        Ok(LoopControl::Continue)
    }

    fn cmd_withdraw(&mut self, args: &[&str]) -> Result<LoopControl, CommandError> {
        let [account, amount, rest @ ..] = args else {
            return Err(invalid("withdraw", "account and amount are required"));
        };
        let amount = parse_amount("withdraw", amount)?;
        let receipt = self.ledger.withdraw(account, amount, &rest.join(" "))?;
        self.print_receipt(&receipt);
        Ok(LoopControl::Continue)
    }

    fn cmd_transfer(&mut self, args: &[&str]) -> Result<LoopControl, CommandError> {
        let [from, to, amount, rest @ ..] = args else {
            return Err(invalid("transfer", "source, destination and amount are required"));
        };
        let amount = parse_amount("transfer", amount)?;
        let receipt = self.ledger.transfer(from, to, amount, &rest.join(" "))?;
        self.print_receipt(&receipt);
        Ok(LoopControl::Continue)
    }

    fn cmd_undo(&mut self) -> Result<LoopControl, CommandError> {
        if self.ledger.undo() {
            output::warning("Last operation undone.");
        } else {
            output::info("Nothing to undo.");
        }
        Ok(LoopControl::Continue)
    }

    fn cmd_subscribe(&mut self, args: &[&str]) -> Result<LoopControl, CommandError> {
        let [account, customer] = args else {
            return Err(invalid("subscribe", "account and customer are required"));
        };
        if self.ledger.subscribe(account, customer)? {
            output::success(format!("{customer} now receives notifications for {account}"));
        } else {
            output::warning(format!("Customer {customer} is not registered"));
        }
        Ok(LoopControl::Continue)
    }

    fn cmd_unsubscribe(&mut self, args: &[&str]) -> Result<LoopControl, CommandError> {
        let [account, customer] = args else {
            return Err(invalid("unsubscribe", "account and customer are required"));
        };
        self.ledger.unsubscribe(account, customer)?;
        output::success(format!("{customer} no longer receives notifications for {account}"));
        Ok(LoopControl::Continue)
    }

    fn cmd_accounts(&self) -> Result<LoopControl, CommandError> {
        let rows: Vec<Vec<String>> = self
            .ledger
            .accounts()
            .into_iter()
            .map(|snapshot| {
                vec![
                    snapshot.id,
                    snapshot.category.to_string(),
                    self.money(snapshot.balance),
                    format!("{:.1}%", snapshot.rate),
                    snapshot.transaction_count.to_string(),
                ]
            })
            .collect();
        if rows.is_empty() {
            output::info("No accounts yet. Use `open` to create one.");
        } else {
            output::table(&["ID", "CATEGORY", "BALANCE", "RATE", "TXNS"], &rows);
        }
        Ok(LoopControl::Continue)
    }

    fn cmd_transactions(&self, args: &[&str]) -> Result<LoopControl, CommandError> {
        let records = match args.first() {
            Some(&"all") => self.ledger.all_transactions(),
            Some(raw) => {
                let limit = raw
                    .parse::<usize>()
                    .map_err(|_| invalid("transactions", format!("`{raw}` is not a count")))?;
                self.ledger.recent_transactions(limit)
            }
            None => self
                .ledger
                .recent_transactions(self.ledger.config().recent_limit),
        };
        if records.is_empty() {
            output::info("No transactions recorded.");
            return Ok(LoopControl::Continue);
        }
        let rows: Vec<Vec<String>> = records
            .into_iter()
            .map(|record| {
                vec![
                    record.id.to_string(),
                    record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                    record.account_id.clone(),
                    record.kind.to_string(),
                    self.money(record.amount),
                    self.money(record.balance_after),
                    record.description,
                ]
            })
            .collect();
        output::table(
            &["ID", "TIME", "ACCOUNT", "KIND", "AMOUNT", "BALANCE", "DESCRIPTION"],
            &rows,
        );
        Ok(LoopControl::Continue)
    }

    fn cmd_summary(&self) -> Result<LoopControl, CommandError> {
        output::section("Balances by category");
        let rows: Vec<Vec<String>> = self
            .ledger
            .balances_by_category()
            .into_iter()
            .map(|(category, total)| vec![category.to_string(), self.money(total)])
            .collect();
        output::table(&["CATEGORY", "BALANCE"], &rows);
        output::info(format!("Total: {}", self.money(self.ledger.total_balance())));
        Ok(LoopControl::Continue)
    }

    fn cmd_interest(&self, args: &[&str]) -> Result<LoopControl, CommandError> {
        let [account, rest @ ..] = args else {
            return Err(invalid("interest", "account is required"));
        };
        let years = match rest.first() {
            Some(raw) => raw
                .parse::<f64>()
                .ok()
                .filter(|years| years.is_finite() && *years >= 0.0)
                .ok_or_else(|| invalid("interest", format!("`{raw}` is not a number of years")))?,
            None => 1.0,
        };
        let due = self.ledger.interest_due(account, years)?;
        output::info(format!(
            "Interest due on {account} over {years} year(s): {}",
            self.money(due)
        ));
        Ok(LoopControl::Continue)
    }

    fn cmd_history(&self) -> Result<LoopControl, CommandError> {
        let history = self.ledger.history();
        if history.is_empty() {
            output::info("Nothing to undo.");
            return Ok(LoopControl::Continue);
        }
        for (position, command) in history.iter().enumerate() {
            let ids: Vec<String> = command
                .transaction_ids()
                .iter()
                .map(ToString::to_string)
                .collect();
            println!(
                "{:>3}. {:<8} {} {}",
                position + 1,
                command.kind().to_string(),
                ids.join(","),
                command.description()
            );
        }
        Ok(LoopControl::Continue)
    }

    fn cmd_help(&self, args: &[&str]) -> Result<LoopControl, CommandError> {
        if let Some(name) = args.first() {
            let entry = COMMANDS
                .iter()
                .find(|entry| entry.name == *name)
                .ok_or_else(|| CommandError::UnknownCommand {
                    name: name.to_string(),
                    suggestion: suggest(name),
                })?;
            output::info(format!("{} - {}", entry.usage, entry.summary));
            return Ok(LoopControl::Continue);
        }
        output::section("Commands");
        for entry in COMMANDS {
            println!("  {:<62} {}", entry.usage, entry.summary);
        }
        Ok(LoopControl::Continue)
    }

    fn print_receipt(&self, receipt: &Receipt) {
        for record in &receipt.records {
            output::success(format!(
                "{} {} {} on {} (balance {})",
                record.id,
                record.kind,
                self.money(record.amount),
                record.account_id,
                self.money(record.balance_after)
            ));
        }
    }

    fn money(&self, amount: f64) -> String {
        self.ledger.config().money_format().format(amount)
    }
}

fn invalid(command: &str, message: impl Into<String>) -> CommandError {
    let usage = COMMANDS
        .iter()
        .find(|entry| entry.name == command)
        .map_or(command, |entry| entry.usage);
    CommandError::InvalidArguments {
        message: message.into(),
        usage: usage.to_string(),
    }
}

fn parse_amount(command: &str, raw: &str) -> Result<f64, CommandError> {
    raw.parse::<f64>()
        .map_err(|_| invalid(command, format!("`{raw}` is not a valid amount")))
}

/// Closest known command within two edits.
fn suggest(input: &str) -> Option<String> {
    COMMANDS
        .iter()
        .map(|entry| (levenshtein(input, entry.name), entry.name))
        .filter(|(distance, _)| *distance <= 2)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, name)| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LedgerError;

    fn context() -> ShellContext {
        ShellContext::with_config(CliMode::Script, LedgerConfig::default())
    }

    #[test]
    fn typos_get_a_suggestion() {
        assert_eq!(suggest("depost").as_deref(), Some("deposit"));
        assert_eq!(suggest("xyzzy"), None);
    }

    #[test]
    fn dispatch_routes_to_the_ledger() {
        let mut ctx = context();
        ctx.dispatch("open", &["savings", "5000"]).unwrap();
        ctx.dispatch("deposit", &["ACC-1001", "200", "monthly", "salary"])
            .unwrap();

        let account = ctx.ledger.account("ACC-1001").unwrap();
        assert_eq!(account.balance(), 5200.0);
        assert_eq!(account.transactions()[0].description, "monthly salary");
    }

    #[test]
    fn ledger_failures_surface_as_command_errors() {
        let mut ctx = context();
        ctx.dispatch("open", &["checking", "10"]).unwrap();
        let err = ctx.dispatch("withdraw", &["ACC-1001", "0"]).unwrap_err();
        assert!(matches!(
            err,
            CommandError::Ledger(LedgerError::InvalidAmount(_))
        ));
    }

    #[test]
    fn missing_arguments_report_usage() {
        let mut ctx = context();
        let err = ctx.dispatch("transfer", &["ACC-1"]).unwrap_err();
        match err {
            CommandError::InvalidArguments { usage, .. } => {
                assert!(usage.starts_with("transfer <from>"));
            }
            other => panic!("expected invalid arguments, got {other:?}"),
        }
    }

    #[test]
    fn exit_stops_the_loop() {
        let mut ctx = context();
        assert_eq!(ctx.dispatch("exit", &[]).unwrap(), LoopControl::Exit);
    }
}
