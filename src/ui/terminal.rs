//! Styled terminal UI.

use std::io::Write;

use console::Term;

use crate::runner::ExecutionSummary;

use super::spinner::LineSpinner;
use super::{OutputMode, PipewrightTheme, ProgressSpinner, SpinnerHandle, UserInterface};

/// Console implementation of [`UserInterface`].
pub struct TerminalUI {
    term: Term,
    err: Term,
    theme: PipewrightTheme,
    mode: OutputMode,
}

impl TerminalUI {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            term: Term::stdout(),
            err: Term::stderr(),
            theme: PipewrightTheme::detect(),
            mode,
        }
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", msg).ok();
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_success(msg)).ok();
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_warning(msg)).ok();
        }
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.err, "{}", self.theme.format_error(msg)).ok();
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "\n{}\n", self.theme.format_header(title)).ok();
        }
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if !self.mode.shows_spinners() {
            Box::new(ProgressSpinner::hidden())
        } else if self.term.is_term() {
            Box::new(ProgressSpinner::new(message))
        } else {
            Box::new(LineSpinner::new(self.theme.clone()))
        }
    }

    fn show_progress(&mut self, current: usize, total: usize) {
        if self.mode.shows_spinners() {
            writeln!(
                self.term,
                "{}",
                self.theme.dim.apply_to(format!("[{}/{}]", current, total))
            )
            .ok();
        }
    }

    fn show_summary(&mut self, summary: &ExecutionSummary) {
        if !self.mode.shows_status() {
            return;
        }

        let theme = &self.theme;
        let mut lines = vec![
            String::new(),
            theme.format_header("Execution summary"),
            theme.format_key_value("Run ID", &summary.run_id),
            theme.format_key_value(
                "Completed",
                &format!("{}/{}", summary.completed(), summary.total_steps),
            ),
            theme.format_key_value("Errors", &summary.errors.len().to_string()),
            theme.format_key_value("Duration", &format!("{:.2}s", summary.duration_secs)),
        ];
        for (step, error) in &summary.errors {
            lines.push(format!("  {}", theme.format_error(&format!("{}: {}", step, error))));
        }
        lines.push(String::new());
        lines.push(if summary.success() {
            theme.format_success("Workflow completed successfully")
        } else {
            theme.format_warning("Workflow completed with errors")
        });

        for line in lines {
            writeln!(self.term, "{}", line).ok();
        }
    }

    fn is_interactive(&self) -> bool {
        self.term.is_term()
    }
}

/// Create the UI for a command run.
pub fn create_ui(mode: OutputMode) -> Box<dyn UserInterface> {
    Box::new(TerminalUI::new(mode))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_ui_keeps_mode() {
        let ui = TerminalUI::new(OutputMode::Quiet);
        assert_eq!(ui.output_mode(), OutputMode::Quiet);
    }

    #[test]
    fn silent_ui_writes_nothing_but_errors() {
        let mut ui = create_ui(OutputMode::Silent);
        ui.message("hidden");
        ui.success("hidden");
        let mut spinner = ui.start_spinner("search");
        spinner.finish_success("search");
    }
}
