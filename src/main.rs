extern crate clap;

use crate::clap::Parser;
use mipbb::cli::*;

pub fn main() {
    Cli::parse().run();
}
