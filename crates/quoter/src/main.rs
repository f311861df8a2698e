use clap::Parser;
use eyre::Result;

use command::QuoterCmd;

mod command;

static HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading}
  {usage}

{all-args}{after-help}";

/// A random quote book, kept in sync with a remote source
#[derive(Parser)]
#[command(
    author = "quoter contributors",
    version = env!("CARGO_PKG_VERSION"),
    help_template(HELP_TEMPLATE),
)]
struct Quoter {
    #[command(subcommand)]
    quoter: QuoterCmd,
}

impl Quoter {
    fn run(self) -> Result<()> {
        self.quoter.run()
    }
}

fn main() -> Result<()> {
    Quoter::parse().run()
}
