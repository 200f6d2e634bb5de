//! Interactive prompt engine.
//!
//! Prompts go to stderr so stdout stays clean. Structurally invalid input
//! re-prompts without terminating; end-of-input or non-interactive use
//! surfaces an input error instead of looping forever.

use std::io::{self, BufRead, Write};

use is_terminal::IsTerminal;

use crate::error::{Error, Result};

pub struct PromptEngine<R: BufRead> {
    reader: R,
    interactive: bool,
}

impl PromptEngine<io::BufReader<io::Stdin>> {
    /// Engine over stdin with automatic TTY detection.
    pub fn stdin() -> Self {
        let interactive = io::stdin().is_terminal();
        Self {
            reader: io::BufReader::new(io::stdin()),
            interactive,
        }
    }
}

impl<R: BufRead> PromptEngine<R> {
    /// Engine over an arbitrary reader (tests feed a `Cursor`).
    pub fn with_reader(reader: R) -> Self {
        Self {
            reader,
            interactive: true,
        }
    }

    fn read_line(&mut self, label: &str, default: Option<&str>) -> Result<String> {
        match default {
            Some(def) => eprint!("{} [{}]: ", label, def),
            None => eprint!("{}: ", label),
        }
        io::stderr().flush().ok();

        let mut input = String::new();
        let read = self
            .reader
            .read_line(&mut input)
            .map_err(|e| Error::Input(format!("failed to read input: {}", e)))?;
        if read == 0 {
            return Err(Error::Input("unexpected end of input".to_string()));
        }

        let trimmed = input.trim();
        if trimmed.is_empty() {
            if let Some(def) = default {
                return Ok(def.to_string());
            }
        }
        Ok(trimmed.to_string())
    }

    /// Ask once; empty input falls back to the default when given.
    pub fn ask(&mut self, label: &str, default: Option<&str>) -> Result<String> {
        self.read_line(label, default)
    }

    /// Ask once; empty input is an immediate input error.
    pub fn ask_required(&mut self, label: &str, field: &str) -> Result<String> {
        let value = self.read_line(label, None)?;
        if value.is_empty() {
            return Err(Error::Input(format!("{} is required", field)));
        }
        Ok(value)
    }

    /// Ask until `valid` accepts the answer. Non-interactive engines get a
    /// single attempt so a piped run fails instead of spinning.
    pub fn ask_validated(
        &mut self,
        label: &str,
        default: Option<&str>,
        valid: impl Fn(&str) -> bool,
        hint: &str,
    ) -> Result<String> {
        loop {
            let value = self.read_line(label, default)?;
            if valid(&value) {
                return Ok(value);
            }
            if !self.interactive {
                return Err(Error::Input(format!("{}: {}", label, hint)));
            }
            eprintln!("{}", hint);
        }
    }
}
