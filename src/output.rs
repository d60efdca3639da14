use colored::Colorize;
use std::fmt::Display;
use std::io::{self, Write};

pub const HEADER: &str = "Generated PR Description:";

/// Write the header line followed by the description exactly as generated.
pub fn write_description<W: Write>(mut out: W, description: &str) -> io::Result<()> {
    writeln!(out, "{}", HEADER.bold())?;
    writeln!(out, "{}", description)
}

/// Write `<context>: <error>` on one line.
pub fn write_error<W: Write>(mut out: W, context: &str, err: &dyn Display) -> io::Result<()> {
    writeln!(out, "{} {}", format!("{context}:").red().bold(), err)
}

pub fn print_description(description: &str) -> io::Result<()> {
    write_description(io::stdout().lock(), description)
}

pub fn print_error(context: &str, err: &dyn Display) -> io::Result<()> {
    write_error(io::stdout().lock(), context, err)
}
