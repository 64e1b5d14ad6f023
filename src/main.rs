mod apply;
mod backup;
mod cli;
mod eve;
mod groups;
mod inventory;
mod links;
mod names;
mod server;
mod store;
mod transfer;

use anyhow::Result;

fn main() -> Result<()> {
    cli::run()
}
