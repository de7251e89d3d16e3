// Terminal presentation - render turns, read user input

use crate::protocol::Role;
use std::io::{BufRead, Write};

/// Where turns are shown and user text comes from
pub trait Presenter {
    fn render(&mut self, role: Role, text: &str);

    /// Next user message, or `None` once the user is done.
    fn read_input(&mut self) -> Option<String>;
}

/// Line-oriented chat on any reader/writer pair (stdin/stdout in the binary)
pub struct TerminalPresenter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPresenter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Presenter for TerminalPresenter<R, W> {
    fn render(&mut self, role: Role, text: &str) {
        let label = match role {
            Role::User => "👤 You",
            Role::Model => "✈️  Rex",
        };
        // A broken terminal leaves nothing to report to
        let _ = writeln!(self.output, "{}: {}\n", label, text);
        let _ = self.output.flush();
    }

    fn read_input(&mut self) -> Option<String> {
        loop {
            let _ = write!(self.output, "👤 You: ");
            let _ = self.output.flush();

            let mut line = String::new();
            match self.input.read_line(&mut line) {
                Ok(0) | Err(_) => return None,
                Ok(_) => {}
            }

            let line = line.trim();
            if line.eq_ignore_ascii_case("quit") {
                return None;
            }
            // Blank input just prompts again
            if !line.is_empty() {
                return Some(line.to_string());
            }
        }
    }
}
