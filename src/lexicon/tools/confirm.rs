//! Confirmation of pending type changes.
//!
//! Every pending change is put to a [`ConfirmationPolicy`] in detection
//! order. The first refusal stops the walk; no subset of changes is ever
//! approved on its own.

use std::io::{self, BufRead, Stdin, StdinLock, Stdout, Write};

use tracing::{debug, info};

use crate::lexicon::tools::error::Result;
use crate::lexicon::tools::model::TypeChange;

/// Decides whether a single type change may be applied.
pub trait ConfirmationPolicy {
    fn decide(&mut self, change: &TypeChange) -> Result<bool>;
}

/// Approves every change. Used for `upload --yes`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysApprove;

impl ConfirmationPolicy for AlwaysApprove {
    fn decide(&mut self, _change: &TypeChange) -> Result<bool> {
        Ok(true)
    }
}

/// Refuses every change. Used when no terminal is available to ask.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysDecline;

impl ConfirmationPolicy for AlwaysDecline {
    fn decide(&mut self, _change: &TypeChange) -> Result<bool> {
        Ok(false)
    }
}

/// Asks a yes/no question per change on a line-oriented terminal.
///
/// An empty answer, or end of input, counts as "no". Unrecognised answers are
/// met with a hint and the question is asked again.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl TerminalPrompt<StdinLock<'static>, Stdout> {
    /// Prompts on the process's standard input and output.
    pub fn stdio() -> Self {
        let stdin: Stdin = io::stdin();
        Self::new(stdin.lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConfirmationPolicy for TerminalPrompt<R, W> {
    fn decide(&mut self, change: &TypeChange) -> Result<bool> {
        loop {
            write!(self.output, "{} [y/N] ", question(change))?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                return Ok(false);
            }
            match parse_answer(&line) {
                Some(answer) => return Ok(answer),
                None => writeln!(self.output, "Please respond with 'yes' or 'no' (or 'y' or 'n').")?,
            }
        }
    }
}

/// Question text shown for a pending change.
pub fn question(change: &TypeChange) -> String {
    format!(
        "Should the type of {} be changed from {} to {}?",
        change.column, change.old_type, change.new_type
    )
}

fn parse_answer(line: &str) -> Option<bool> {
    match line.trim().to_lowercase().as_str() {
        "" | "no" | "n" => Some(false),
        "yes" | "y" | "ye" => Some(true),
        _ => None,
    }
}

/// Result of walking the pending changes through a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Approved,
    /// The first change that was refused.
    Declined(TypeChange),
}

impl Decision {
    pub fn is_approved(&self) -> bool {
        matches!(self, Decision::Approved)
    }
}

/// Puts each pending change to `policy`, stopping at the first refusal.
///
/// With no pending changes the policy is never consulted.
pub fn confirm(changes: &[TypeChange], policy: &mut dyn ConfirmationPolicy) -> Result<Decision> {
    for change in changes {
        if policy.decide(change)? {
            debug!(%change, "type change approved");
        } else {
            info!(%change, "type change declined");
            return Ok(Decision::Declined(change.clone()));
        }
    }
    Ok(Decision::Approved)
}
