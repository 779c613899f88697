use crate::cli::run;

pub mod cli;
mod config;
pub mod domain;
pub mod game;
pub mod http;
pub mod spotify;

fn main() -> anyhow::Result<()> {
    run()
}
