//! Print colored text.
//!
//! Provides functions and macros that simulate the `cargo` output style on `stderr`, keeping `stdout` free for the
//! listings and summaries the tools produce.

use error::Error;

use termcolor::*;

use std::fmt;
use std::io::{Result, Write};

/// Prints a progress (green tag, right-aligned), similar to the cargo output.
#[allow(unused_macros)]
macro_rules! progress {
    ($tag:expr, $($args:tt)+) => {
        ::ui::print_tagged(::termcolor::Color::Green, &format!("{:>12} ", $tag), format_args!($($args)+))
            .expect("print progress")
    }
}

/// Prints a warning (yellow `warning:` tag), similar to cargo output.
#[allow(unused_macros)]
macro_rules! warning {
    ($($args:tt)+) => {
        ::ui::print_tagged(::termcolor::Color::Yellow, "warning: ", format_args!($($args)+)).expect("print warning")
    }
}

/// Prints `tag` in bold `color`, followed by the uncolored message.
pub fn print_tagged(color: Color, tag: &str, message: fmt::Arguments) -> Result<()> {
    let stream = StandardStream::stderr(ColorChoice::Auto);
    let mut lock = stream.lock();
    lock.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(lock, "{}", tag)?;
    lock.reset()?;
    writeln!(lock, "{}", message)
}

/// Prints an error and the causes.
pub fn print_error(error: &Error) -> Result<()> {
    let stream = StandardStream::stderr(ColorChoice::Auto);
    let mut lock = stream.lock();

    for (i, e) in error.iter().enumerate() {
        if i == 0 {
            lock.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_intense(true).set_bold(true))?;
            write!(lock, "error: ")?;
        } else {
            lock.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
            write!(lock, "caused by: ")?;
        }
        lock.reset()?;
        writeln!(lock, "{}", e)?;
    }
    if let Some(backtrace) = error.backtrace() {
        writeln!(lock, "\n{:?}", backtrace)?;
    }
    Ok(())
}
