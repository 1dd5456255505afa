use std::cell::RefCell;
use std::fmt::Display;
use std::path::Path;
use std::str::Chars;

use colored::Colorize;

/// Host-side reporting, kept apart from the machine's own console output.
///
/// Status lines go to stdout, diagnostics to stderr. With `--minimal`, status lines are dropped
/// and diagnostics lose their color.
#[derive(Clone, Copy, Debug)]
pub enum Output {
    /// Progress of the emulator itself, eg. `Loading`, `Running`.
    Status,
    /// Non-fatal conditions in the running program.
    Diagnostic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MsgColor {
    Green,
    Cyan,
    Yellow,
    Red,
}

struct Decolored<'a> {
    chars: Chars<'a>,
}

impl Output {
    thread_local! {
        static IS_LINE_START: RefCell<bool> = const { RefCell::new(true) };
        static IS_MINIMAL: RefCell<bool> = const { RefCell::new(false) };
    }

    pub fn set_line_start(new_value: bool) -> bool {
        Self::IS_LINE_START.with(|value| value.replace(new_value))
    }
    fn is_line_start() -> bool {
        Self::IS_LINE_START.with(|value| *value.borrow())
    }
    pub fn set_minimal(new_value: bool) -> bool {
        Self::IS_MINIMAL.with(|value| value.replace(new_value))
    }
    pub fn is_minimal() -> bool {
        Self::IS_MINIMAL.with(|value| *value.borrow())
    }

    /// Print a right-aligned, colored label followed by a message.
    pub fn message(&self, color: MsgColor, left: &str, right: impl Display) {
        let left = match color {
            MsgColor::Green => left.green(),
            MsgColor::Cyan => left.cyan(),
            MsgColor::Yellow => left.yellow(),
            MsgColor::Red => left.red(),
        }
        .bold();
        let line = format!("{left:>12} {right}\n");
        self.print_str(&line);
    }

    pub fn file_message(&self, color: MsgColor, left: &str, path: &Path) {
        self.message(color, left, format!("target {}", path.display()));
    }

    fn print_str(&self, string: &str) {
        match (self, Self::is_minimal()) {
            (Self::Status, true) => (),
            (Self::Status, false) => {
                self.start_new_line();
                print!("{}", string);
                Self::set_line_start(true);
            }
            (Self::Diagnostic, minimal) => {
                // Machine output is on stdout, but usually shares a terminal with stderr
                self.start_new_line();
                if minimal {
                    eprint!("{}", Decolored::new(string).collect::<String>());
                } else {
                    eprint!("{}", string);
                }
                Self::set_line_start(true);
            }
        }
    }

    fn start_new_line(&self) {
        if !Self::is_line_start() {
            match self {
                Self::Status => println!(),
                Self::Diagnostic => eprintln!(),
            }
            Self::set_line_start(true);
        }
    }
}

/// Report a non-fatal condition in the running program.
pub fn warning(message: impl Display) {
    Output::Diagnostic.message(MsgColor::Yellow, "Warning", message);
}

/// Report an instruction about to execute.
pub fn trace(message: impl Display) {
    Output::Diagnostic.message(MsgColor::Cyan, "Trace", message);
}

impl<'a> Decolored<'a> {
    pub fn new(string: &'a str) -> Self {
        Self {
            chars: string.chars(),
        }
    }
}

impl Iterator for Decolored<'_> {
    type Item = char;
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(ch) = self.chars.next() {
            // Skip everything between '\x1b' and 'm' (inclusive)
            if ch == '\x1b' {
                while self.chars.next().is_some_and(|ch| ch != 'm') {}
                continue;
            }
            return Some(ch);
        }
        None
    }
}
