pub mod args;

pub use args::{Arguments, GenomeBuild};
use clap::Parser;

pub fn parse() -> Arguments {
    Arguments::parse()
}
