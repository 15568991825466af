use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::balance::Lookup;
use crate::error::Result;
use crate::keys::PrivateKey;
use crate::sink::{Record, ResultSink};

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Number of key pairs to generate and check.
    pub batch: usize,
    /// Cap on how many checks may be in flight at once.
    pub parallel: usize,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub failed: usize,
}

/// Runs the whole batch: every item generates a key pair, derives its
/// address, asks the lookup for the balance and hands the result to the
/// sink. Items are independent; one failing is logged and counted, never
/// letting it touch its siblings. Returns once every item has settled.
pub async fn run<L: Lookup>(config: &RunConfig, lookup: &L, sink: Arc<ResultSink>) -> RunSummary {
    let permits = Arc::new(Semaphore::new(config.parallel.max(1)));
    let mut items = JoinSet::new();

    for index in 0..config.batch {
        let permits = Arc::clone(&permits);
        let lookup = lookup.clone();
        let sink = Arc::clone(&sink);

        items.spawn(async move {
            // the semaphore is never closed, so acquisition cannot fail
            let _permit = permits.acquire_owned().await.ok();
            (index, check_one(&lookup, &sink).await)
        });
    }

    let mut summary = RunSummary::default();
    while let Some(settled) = items.join_next().await {
        match settled {
            Ok((index, Ok(()))) => {
                debug!("item {index} recorded");
                summary.completed += 1;
            }
            Ok((index, Err(e))) => {
                warn!("item {index} abandoned: {e}");
                summary.failed += 1;
            }
            Err(e) => {
                warn!("item panicked: {e}");
                summary.failed += 1;
            }
        }
    }

    summary
}

async fn check_one<L: Lookup>(lookup: &L, sink: &ResultSink) -> Result<()> {
    let key = PrivateKey::generate()?;
    let public = key.public_key();
    let address = public.address();

    let amount = lookup.fetch(&address).await?;

    let record = Record {
        wif: key.to_wif(),
        public_key: public.to_hex(),
        address,
        amount,
    };
    sink.emit(&record).await
}
