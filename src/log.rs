//! Levelled console output with coloured tags.
//!
//! `INFO` and `TRACE` go to stdout, `WARN` and `ERROR` to stderr.

use std::fmt::Display;

use ansi_term::Colour::{Blue, Green, Red, Yellow};

pub fn info(msg: impl Display) {
    println!("{} {}", Green.bold().paint("INFO"), msg);
}

pub fn warn(msg: impl Display) {
    eprintln!("{} {}", Yellow.bold().paint("WARN"), msg);
}

pub fn error(msg: impl Display) {
    eprintln!("{} {}", Red.bold().paint("ERROR"), msg);
}

pub fn trace(msg: impl Display) {
    println!("{} {}", Blue.paint("TRACE"), msg);
}
