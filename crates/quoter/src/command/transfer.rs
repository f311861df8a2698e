use std::path::PathBuf;

use clap::Args;
use eyre::{Result, WrapErr, bail};

use quoter_client::{Error, QuoteStore, store::NOTICE_IMPORTED, transfer::DEFAULT_EXPORT_FILE};

use super::{alert, notify};

#[derive(Args, Debug)]
pub struct Export {
    /// File to write; "-" writes to stdout
    #[arg(long, short, default_value = DEFAULT_EXPORT_FILE)]
    output: PathBuf,
}

impl Export {
    pub fn run(self, store: &QuoteStore) -> Result<()> {
        if self.output.as_os_str() == "-" {
            println!("{}", store.export_json()?);
            return Ok(());
        }

        quoter_client::transfer::export_to_path(store.quotes(), &self.output)
            .wrap_err_with(|| format!("could not export to {}", self.output.display()))?;

        notify(&format!(
            "Exported {} quotes to {}",
            store.len(),
            self.output.display()
        ));
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct Import {
    /// JSON file holding an array of quotes
    file: PathBuf,
}

impl Import {
    pub fn run(self, mut store: QuoteStore) -> Result<()> {
        match store.import_file(&self.file) {
            Ok(added) => {
                tracing::debug!(added, "import finished");
                notify(NOTICE_IMPORTED);
                Ok(())
            }
            Err(Error::Import(e)) => {
                alert(&e.to_string());
                bail!("nothing imported from {}", self.file.display())
            }
            Err(e) => Err(e).wrap_err_with(|| format!("could not import {}", self.file.display())),
        }
    }
}
