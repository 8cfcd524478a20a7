use tracing::debug;

use crate::error::{SyncError, SyncResult};
use crate::providers::TranslationProvider;

/// The credentialed providers available to one run.
#[derive(Debug)]
pub struct ClientPool<P> {
    providers: Vec<P>,
}

impl<P: TranslationProvider> ClientPool<P> {
    pub fn new(providers: Vec<P>) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &[P] {
        &self.providers
    }

    /// The provider with the most remaining quota; the earliest one wins a
    /// tie. Quotas are read again on every call.
    pub async fn best(&mut self) -> SyncResult<&mut P> {
        let mut best: Option<(usize, u64)> = None;
        for (index, provider) in self.providers.iter_mut().enumerate() {
            let remaining = provider.usage().await?;
            if remaining == 0 {
                continue;
            }
            if best.is_none_or(|(_, current)| remaining > current) {
                best = Some((index, remaining));
            }
        }
        let (index, remaining) =
            best.ok_or_else(|| SyncError::usage("no provider has remaining characters"))?;
        let provider = &mut self.providers[index];
        debug!(
            "selected provider #{} ({}) with {} characters left",
            index,
            provider.name(),
            remaining
        );
        Ok(provider)
    }
}
