use std::io::{self, BufRead, Write};
use std::str::FromStr;

use crate::application::{AppError, LedgerService};
use crate::domain::Cents;

use super::{write_accounts, write_balance, write_statement};

pub const PROMPT: &str =
    "Enter command (list, create, deposit, withdraw, transfer, balance, statement, quit): ";

/// Commands understood by the interactive session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    List,
    Create,
    Deposit,
    Withdraw,
    Transfer,
    Balance,
    Statement,
    Quit,
}

impl FromStr for SessionCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "list" => Ok(SessionCommand::List),
            "create" => Ok(SessionCommand::Create),
            "deposit" => Ok(SessionCommand::Deposit),
            "withdraw" => Ok(SessionCommand::Withdraw),
            "transfer" => Ok(SessionCommand::Transfer),
            "balance" => Ok(SessionCommand::Balance),
            "statement" => Ok(SessionCommand::Statement),
            "quit" => Ok(SessionCommand::Quit),
            other => Err(other.to_string()),
        }
    }
}

/// Why a command stopped before reaching the ledger.
enum Interrupt {
    /// Input ran out mid-command
    Eof,
    /// A field could not be parsed; reported and the loop continues
    Invalid(String),
    Io(io::Error),
}

impl From<io::Error> for Interrupt {
    fn from(e: io::Error) -> Self {
        Interrupt::Io(e)
    }
}

type Step = Result<(), Interrupt>;

/// Line-oriented interactive loop over a [`LedgerService`].
///
/// Each command is read on its own line, then its fields are prompted for one
/// line at a time. Every failure is reported and control returns to the
/// command prompt; only `quit`, end of input, or an I/O error on the streams
/// ends the session.
pub struct Session<'a, R, W> {
    service: &'a mut LedgerService,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Session<'a, R, W> {
    pub fn new(service: &'a mut LedgerService, input: R, output: W) -> Self {
        Self {
            service,
            input,
            output,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        loop {
            write!(self.output, "{}", PROMPT)?;
            self.output.flush()?;

            let Some(line) = self.read_line()? else {
                break;
            };
            let word = line.trim();
            if word.is_empty() {
                continue;
            }

            let command = match word.parse::<SessionCommand>() {
                Ok(SessionCommand::Quit) => break,
                Ok(command) => command,
                Err(_) => {
                    writeln!(self.output, "Unknown command...")?;
                    continue;
                }
            };
            tracing::debug!(?command, "session command");

            match self.dispatch(command) {
                Ok(()) => {}
                Err(Interrupt::Invalid(message)) => writeln!(self.output, "{}", message)?,
                Err(Interrupt::Eof) => break,
                Err(Interrupt::Io(e)) => return Err(e),
            }
        }

        writeln!(self.output, "Exiting system...")?;
        self.output.flush()
    }

    fn dispatch(&mut self, command: SessionCommand) -> Step {
        match command {
            SessionCommand::List => {
                write_accounts(&mut self.output, self.service.list_accounts())?;
                Ok(())
            }
            SessionCommand::Create => self.create(),
            SessionCommand::Deposit => self.deposit(),
            SessionCommand::Withdraw => self.withdraw(),
            SessionCommand::Transfer => self.transfer(),
            SessionCommand::Balance => self.balance(),
            SessionCommand::Statement => self.statement(),
            SessionCommand::Quit => Ok(()),
        }
    }

    fn create(&mut self) -> Step {
        let id = self.prompt("Enter account id: ")?;
        let name = self.prompt("Enter name: ")?;
        let balance = self.prompt_cents("Enter initial balance (cents): ")?;

        match self.service.create_account(&id, &name, balance) {
            Ok(_) => writeln!(self.output, "Account created successfully!")?,
            Err(e) => self.report_failure(&e)?,
        }
        Ok(())
    }

    fn deposit(&mut self) -> Step {
        let id = self.prompt("Account id: ")?;
        let amount = self.prompt_cents("Enter amount (cents): ")?;
        let note = self.prompt("Enter note: ")?;

        match self.service.deposit(&id, amount, &note) {
            Ok(tx) => writeln!(self.output, "Deposit successful! (tx {})", tx.tx_id)?,
            Err(e) => self.report_failure(&e)?,
        }
        Ok(())
    }

    fn withdraw(&mut self) -> Step {
        let id = self.prompt("Account id: ")?;
        let amount = self.prompt_cents("Enter amount (cents): ")?;
        let note = self.prompt("Enter note: ")?;

        match self.service.withdraw(&id, amount, &note) {
            Ok(tx) => writeln!(self.output, "Withdraw successful! (tx {})", tx.tx_id)?,
            Err(e) => self.report_failure(&e)?,
        }
        Ok(())
    }

    fn transfer(&mut self) -> Step {
        let from = self.prompt("Enter From account id: ")?;
        let to = self.prompt("Enter To account id: ")?;
        let amount = self.prompt_cents("Enter amount (cents): ")?;
        let note = self.prompt("Enter note: ")?;

        match self.service.transfer(&from, &to, amount, &note) {
            Ok(tx) => writeln!(self.output, "Transfer successful! (tx {})", tx.tx_id)?,
            Err(e) => self.report_failure(&e)?,
        }
        Ok(())
    }

    fn balance(&mut self) -> Step {
        let id = self.prompt("Enter account id: ")?;
        match self.service.balance(&id) {
            Ok(balance) => write_balance(&mut self.output, balance)?,
            Err(e) => writeln!(self.output, "{}", e)?,
        }
        Ok(())
    }

    fn statement(&mut self) -> Step {
        let id = self.prompt("Enter account id: ")?;
        let raw = self.prompt("Enter limit: ")?;
        let limit: usize = raw
            .parse()
            .map_err(|_| Interrupt::Invalid(format!("Invalid limit: {:?}", raw)))?;

        match self.service.statement(&id, limit) {
            Ok(rows) => write_statement(&mut self.output, &rows)?,
            Err(e) => writeln!(self.output, "{}", e)?,
        }
        Ok(())
    }

    /// A failed save means the change happened in memory only.
    fn report_failure(&mut self, e: &AppError) -> io::Result<()> {
        writeln!(self.output, "{}", e)?;
        if e.is_unsaved() {
            writeln!(
                self.output,
                "The change is held in memory but was not saved to disk."
            )?;
        }
        Ok(())
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    fn prompt(&mut self, label: &str) -> Result<String, Interrupt> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;
        match self.read_line()? {
            Some(line) => Ok(line.trim().to_string()),
            None => Err(Interrupt::Eof),
        }
    }

    fn prompt_cents(&mut self, label: &str) -> Result<Cents, Interrupt> {
        let raw = self.prompt(label)?;
        raw.parse()
            .map_err(|_| Interrupt::Invalid(format!("Invalid amount: {:?}", raw)))
    }
}
