use clap::Args;
use eyre::{Result, WrapErr};
use tokio::sync::Mutex;

use quoter_client::{
    QuoteStore, Settings,
    sync::{self, HttpRemote, MergePolicy},
};

use super::notify;

#[derive(Args, Debug)]
pub struct Cmd {
    /// Merge policy for this run, overriding the configured one
    #[arg(long)]
    policy: Option<MergePolicy>,

    /// Push the local collection to the remote after merging
    #[arg(long)]
    push: bool,
}

impl Cmd {
    pub async fn run(self, settings: &Settings, store: QuoteStore) -> Result<()> {
        let mut sync_settings = settings.sync.clone();
        if let Some(policy) = self.policy {
            sync_settings.policy = policy;
        }
        sync_settings.push |= self.push;

        let remote = HttpRemote::new(
            sync_settings.endpoint.clone(),
            sync_settings.request_timeout(),
        )?;

        let store = Mutex::new(store);
        let outcome = sync::sync(&store, &remote, &sync_settings)
            .await
            .wrap_err_with(|| format!("could not sync with {}", sync_settings.endpoint))?;

        notify(&format!(
            "Synced with server: {} fetched, {} new, {} pushed",
            outcome.fetched, outcome.added, outcome.pushed
        ));

        Ok(())
    }
}
