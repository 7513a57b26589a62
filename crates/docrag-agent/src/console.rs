//! Terminal front ends: one-shot ask, fraud-pattern chat and the
//! transaction monitor menu.
//!
//! Input is any `AsyncBufRead` and output any `Write`, so the loops run
//! against in-memory buffers in tests.

use std::io::Write;
use std::time::Duration;

use docrag_settings::MonitorSettings;
use rand::Rng;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::driver::{Answer, RagDriver, RagError};
use crate::prompts::PromptTemplate;
use crate::scenarios::{self, TransactionScenario};

const RULE_WIDE: usize = 60;
const RULE_NARROW: usize = 50;

/// Errors that end an interactive session.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Retrieval or completion failed (or was cancelled).
    #[error(transparent)]
    Rag(#[from] RagError),
    /// Reading input or writing output failed.
    #[error("console I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ConsoleError {
    /// Whether the session ended because of cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Rag(RagError::Cancelled))
    }
}

type Result<T> = std::result::Result<T, ConsoleError>;

/// Print the matches and the response of a one-shot question.
pub async fn ask<W: Write>(
    driver: &RagDriver,
    prompt: &PromptTemplate,
    question: &str,
    out: &mut W,
) -> Result<()> {
    let answer = driver.answer(question, prompt).await?;
    write_matches(out, &answer, true)?;
    writeln!(out, "Response: {}", answer.response)?;
    Ok(())
}

/// Print the best match and, when `with_second` is set, the runner-up.
fn write_matches<W: Write>(out: &mut W, answer: &Answer, with_second: bool) -> std::io::Result<()> {
    let second = if with_second { answer.second() } else { None };
    for (label, scored) in [("Best", answer.best()), ("Second best", second)] {
        if let Some(scored) = scored {
            writeln!(
                out,
                "{label} matching document: {} with score {:.2}",
                scored.document_id, scored.score
            )?;
        }
    }
    Ok(())
}

/// Monitor menu entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuChoice {
    /// Generate transactions one at a time with a pause between them.
    Simulate,
    /// Generate a batch, list it, then analyze each.
    Batch,
    /// Analyze a description typed by the user.
    Manual,
    /// Leave the monitor.
    Exit,
}

impl MenuChoice {
    /// Parse the menu number; anything else is `None`.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::Simulate),
            "2" => Some(Self::Batch),
            "3" => Some(Self::Manual),
            "4" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Line-oriented interactive session.
pub struct Console<R, W> {
    lines: Lines<R>,
    out: W,
    cancel: CancellationToken,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    /// Wrap an input stream and an output sink.
    pub fn new(input: R, out: W, cancel: CancellationToken) -> Self {
        Self {
            lines: input.lines(),
            out,
            cancel,
        }
    }

    /// Print `prompt` and read one trimmed line; `None` at end of input.
    async fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.out, "{prompt}")?;
        self.out.flush()?;
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(RagError::Cancelled.into()),
            line = self.lines.next_line() => Ok(line?.map(|l| l.trim().to_string())),
        }
    }

    async fn pause(&self, millis: u64) -> Result<()> {
        tokio::select! {
            () = tokio::time::sleep(Duration::from_millis(millis)) => Ok(()),
            () = self.cancel.cancelled() => Err(RagError::Cancelled.into()),
        }
    }

    /// Report a failed question and keep going, unless it was cancelled.
    fn recover(&mut self, err: RagError) -> Result<()> {
        if matches!(err, RagError::Cancelled) {
            return Err(err.into());
        }
        warn!(error = %err, "request failed");
        writeln!(self.out, "Error: {err}")?;
        Ok(())
    }

    fn banner(&mut self, title: &str, width: usize) -> Result<()> {
        let rule = "=".repeat(width);
        writeln!(self.out, "\n{rule}\n{title}\n{rule}")?;
        Ok(())
    }

    /// Answer questions about fraud patterns until `exit`, `quit` or end of
    /// input.
    pub async fn chat(&mut self, driver: &RagDriver, prompt: &PromptTemplate) -> Result<()> {
        writeln!(self.out, "Type 'exit' or 'quit' to leave.")?;
        loop {
            let Some(line) = self
                .read_line("\nEnter your question about bank fraud patterns: ")
                .await?
            else {
                writeln!(self.out)?;
                break;
            };
            if line.is_empty() {
                continue;
            }
            if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
                break;
            }
            match driver.answer(&line, prompt).await {
                Ok(answer) => {
                    write_matches(&mut self.out, &answer, false)?;
                    writeln!(self.out, "Response: {}", answer.response)?;
                }
                Err(err) => self.recover(err)?,
            }
        }
        Ok(())
    }

    /// Run the monitor menu until the user exits or input ends.
    pub async fn monitor<G: Rng>(
        &mut self,
        driver: &RagDriver,
        prompt: &PromptTemplate,
        settings: &MonitorSettings,
        rng: &mut G,
    ) -> Result<()> {
        loop {
            self.banner("NIGERIAN BANK FRAUD DETECTION SYSTEM", RULE_NARROW)?;
            writeln!(self.out, "1. Simulate Real-time Transactions")?;
            writeln!(self.out, "2. Batch Analyze Transactions")?;
            writeln!(self.out, "3. Manual Transaction Input")?;
            writeln!(self.out, "4. Exit")?;

            let Some(choice) = self.read_line("\nSelect option (1-4): ").await? else {
                writeln!(self.out)?;
                break;
            };
            match MenuChoice::parse(&choice) {
                Some(MenuChoice::Simulate) => self.simulate(driver, prompt, settings, rng).await?,
                Some(MenuChoice::Batch) => self.batch(driver, prompt, settings, rng).await?,
                Some(MenuChoice::Manual) => {
                    let description = self
                        .read_line("Enter transaction description to analyze: ")
                        .await?;
                    match description {
                        Some(d) if !d.is_empty() => self.analyze(driver, prompt, &d).await?,
                        Some(_) => writeln!(self.out, "Nothing to analyze.")?,
                        None => break,
                    }
                }
                Some(MenuChoice::Exit) => {
                    writeln!(self.out, "Exiting system...")?;
                    break;
                }
                None => writeln!(self.out, "Invalid choice. Please select 1-4.")?,
            }
        }
        Ok(())
    }

    async fn simulate<G: Rng>(
        &mut self,
        driver: &RagDriver,
        prompt: &PromptTemplate,
        settings: &MonitorSettings,
        rng: &mut G,
    ) -> Result<()> {
        self.banner("SIMULATING REAL-TIME BANK TRANSACTIONS", RULE_WIDE)?;
        for i in 0..settings.simulate_count {
            let scenario = scenarios::generate(rng);
            writeln!(self.out, "\n--- Transaction {} ---", i + 1)?;
            self.describe(&scenario)?;
            self.analyze(driver, prompt, &scenario.description).await?;
            if i + 1 < settings.simulate_count {
                self.pause(settings.interval_ms).await?;
            }
        }
        Ok(())
    }

    async fn batch<G: Rng>(
        &mut self,
        driver: &RagDriver,
        prompt: &PromptTemplate,
        settings: &MonitorSettings,
        rng: &mut G,
    ) -> Result<()> {
        self.banner("BATCH TRANSACTION ANALYSIS", RULE_WIDE)?;
        let batch = scenarios::generate_batch(rng, settings.batch_size);

        writeln!(self.out, "\nGenerated Transactions:")?;
        for (i, scenario) in batch.iter().enumerate() {
            writeln!(self.out, "{}. {}", i + 1, scenario.description)?;
        }
        for (i, scenario) in batch.iter().enumerate() {
            writeln!(self.out, "\n--- Analyzing Transaction {} ---", i + 1)?;
            self.analyze(driver, prompt, &scenario.description).await?;
        }
        Ok(())
    }

    fn describe(&mut self, scenario: &TransactionScenario) -> Result<()> {
        writeln!(self.out, "Description: {}", scenario.description)?;
        writeln!(
            self.out,
            "Type: {}",
            scenario.kind.to_string().to_uppercase()
        )?;
        if let Some(pattern) = scenario.pattern {
            writeln!(self.out, "Pattern: {pattern}")?;
        }
        let details: Vec<String> = [
            scenario.amount.map(|a| format!("Amount: ₦{a}")),
            scenario.merchant.map(|m| format!("Channel: {m}")),
            scenario.location.as_ref().map(|l| format!("Location: {l}")),
            scenario.time.map(|t| format!("Time: {t}")),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !details.is_empty() {
            writeln!(self.out, "{}", details.join(" | "))?;
        }
        Ok(())
    }

    async fn analyze(
        &mut self,
        driver: &RagDriver,
        prompt: &PromptTemplate,
        description: &str,
    ) -> Result<()> {
        match driver.answer(description, prompt).await {
            Ok(answer) => {
                if let Some(best) = answer.best() {
                    writeln!(
                        self.out,
                        "📊 Best matching document: {} (score: {:.2})",
                        best.document_id, best.score
                    )?;
                }
                writeln!(self.out, "🔍 Analysis: {}", answer.response)?;
                Ok(())
            }
            Err(err) => self.recover(err),
        }
    }
}
