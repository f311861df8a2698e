use clap::Args;
use eyre::Result;

use quoter_client::{QuoteStore, Settings};

#[derive(Args, Debug)]
pub struct Cmd {
    /// Also write logs to the console, not only the log file
    #[arg(long)]
    show_logs: bool,
}

impl Cmd {
    pub fn show_logs(&self) -> bool {
        self.show_logs
    }

    pub async fn run(self, settings: Settings, store: QuoteStore) -> Result<()> {
        tracing::info!(
            quotes = store.len(),
            storage = %settings.durable_storage_path().display(),
            "starting quoter daemon"
        );

        quoter_daemon::boot(settings, store).await
    }
}
