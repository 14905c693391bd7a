use std::ops::ControlFlow;
use std::path::PathBuf;

use color_eyre::eyre::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;

use crate::data::FeeService;
use crate::data::cache::RateCache;
use crate::data::chains::{get_chain, supported_chains};
use crate::data::export::{default_export_path, export_rows_csv, BATCH_EXPORT_NAME};
use crate::data::normalize::normalize;
use crate::data::types::{ChainTarget, FeeUnits, NormalizedRow};
use crate::report::render_record;
use crate::utils::{format_amount, parse_tx_hash};

const HELP: &str = "\
<tx hash>        look up a transaction on the current chain
chain <name>     switch chain
rate             show the cached exchange rate
refresh          drop the cached rate so the next lookup refetches it
export [path]    write this session's lookups as CSV
help             show this help
quit             leave";

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Lookup(String),
    Chain(String),
    Rate,
    Refresh,
    Export(Option<PathBuf>),
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_command(line: &str) -> ShellCommand {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };
    match head.to_lowercase().as_str() {
        "" => ShellCommand::Empty,
        "chain" if !rest.is_empty() => ShellCommand::Chain(rest.to_string()),
        "rate" => ShellCommand::Rate,
        "refresh" => ShellCommand::Refresh,
        "export" if rest.is_empty() => ShellCommand::Export(None),
        "export" => ShellCommand::Export(Some(PathBuf::from(rest))),
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        _ => match parse_tx_hash(line) {
            Some(hash) => ShellCommand::Lookup(format!("{hash:#x}")),
            None => ShellCommand::Unknown(line.to_string()),
        },
    }
}

/// Line-oriented session over one [`FeeService`]. Lookups accumulate so
/// they can be exported together.
pub struct Shell<'a> {
    service: &'a FeeService,
    cache: &'a RateCache,
    chain: &'static ChainTarget,
    include_wallets: bool,
    rows: Vec<NormalizedRow>,
}

impl<'a> Shell<'a> {
    pub fn new(service: &'a FeeService, cache: &'a RateCache, chain: &'static ChainTarget, include_wallets: bool) -> Self {
        Self {
            service,
            cache,
            chain,
            include_wallets,
            rows: Vec::new(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        stdout
            .write_all(format!("gas-vision on {}. Type 'help' for commands.\n", self.chain.display_name).as_bytes())
            .await?;
        loop {
            stdout.write_all(format!("{}> ", self.chain.name).as_bytes()).await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            match self.execute(parse_command(&line)).await {
                ControlFlow::Continue(output) if output.is_empty() => {}
                ControlFlow::Continue(output) => {
                    stdout.write_all(format!("{output}\n").as_bytes()).await?;
                }
                ControlFlow::Break(()) => break,
            }
        }
        Ok(())
    }

    pub async fn execute(&mut self, command: ShellCommand) -> ControlFlow<(), String> {
        let output = match command {
            ShellCommand::Empty => String::new(),
            ShellCommand::Quit => return ControlFlow::Break(()),
            ShellCommand::Help => HELP.to_string(),
            ShellCommand::Chain(name) => match get_chain(&name) {
                Some(chain) => {
                    self.chain = chain;
                    format!("Switched to {}", chain.display_name)
                }
                None => format!("Unknown chain '{name}'. Supported: {}", supported_chains().join(", ")),
            },
            ShellCommand::Rate => {
                let rate = self.service.current_rate(self.cache).await;
                format!("1 {} = {} {}", self.chain.symbol, format_amount(rate), self.currency())
            }
            ShellCommand::Refresh => {
                self.cache.invalidate().await;
                "Exchange rate will be refetched on next use".to_string()
            }
            ShellCommand::Export(path) => self.export(path),
            ShellCommand::Lookup(hash) => {
                match self.service.fetch_transaction(self.chain.name, &hash, None, self.cache).await {
                    Ok(record) => {
                        self.rows.push(normalize(&record));
                        render_record(&record, self.chain.symbol, &self.currency())
                    }
                    Err(e) => {
                        warn!(chain = self.chain.name, hash = %hash, error = %e, "lookup failed");
                        format!("Error: {e}")
                    }
                }
            }
            ShellCommand::Unknown(input) => format!("Not a command or transaction hash: '{input}' (try 'help')"),
        };
        ControlFlow::Continue(output)
    }

    fn export(&self, path: Option<PathBuf>) -> String {
        if self.rows.is_empty() {
            return "Nothing to export yet".to_string();
        }
        let path = path.unwrap_or_else(|| default_export_path(BATCH_EXPORT_NAME));
        let units = FeeUnits::new(self.chain.symbol, self.service.rates().currency());
        match export_rows_csv(&self.rows, &path, &units, self.include_wallets) {
            Ok(message) => message,
            Err(e) => format!("Error: {e}"),
        }
    }

    fn currency(&self) -> String {
        self.service.rates().currency().to_uppercase()
    }
}
