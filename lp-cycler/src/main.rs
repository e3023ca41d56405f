#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

mod cli;

fn main() -> anyhow::Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(cli::run_cli())
}
