//! Line-based prompting for values not given on the command line.

use std::io::{BufRead, Write};

use crate::error::StaticIpError;

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Prompter { input, output }
    }

    /// Asks until the answer passes `check`. An empty answer takes `default`
    /// when there is one; a required field re-asks on empty.
    ///
    /// Closed input yields whatever was typed so far (usually the empty
    /// string) so the caller's validation reports it instead of looping.
    pub fn ask<T, E: std::fmt::Display>(
        &mut self,
        message: &str,
        default: Option<&str>,
        required: bool,
        check: impl Fn(&str) -> Result<T, E>,
    ) -> Result<String, StaticIpError> {
        loop {
            match default {
                Some(default) => write!(self.output, "{message} [{default}]: ")?,
                None => write!(self.output, "{message}: ")?,
            }
            self.output.flush()?;

            let mut line = String::new();
            let eof = self.input.read_line(&mut line)? == 0;
            let mut answer = line.trim().to_string();
            if answer.is_empty()
                && let Some(default) = default
            {
                answer = default.to_string();
            }

            if eof {
                return Ok(answer);
            }
            if answer.is_empty() {
                if required {
                    writeln!(self.output, "  - This field is required.")?;
                    continue;
                }
                return Ok(answer);
            }
            match check(&answer) {
                Ok(_) => return Ok(answer),
                Err(reason) => writeln!(self.output, "  - Invalid value: {reason}")?,
            }
        }
    }
}
