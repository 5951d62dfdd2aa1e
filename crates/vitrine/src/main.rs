mod bindings;
mod bootstrap;
mod cli;
mod defaults;
mod paths;
mod run;
mod show;

use anyhow::Result;

fn main() -> Result<()> {
    let args = cli::parse();
    run::run(args)
}
