use crate::core::accounts::{AccountService, SyncReadiness};
use crate::core::fetcher::CollectionFetcher;
use crate::core::orchestrator::{
    pending_names, SyncJob, SyncOrchestrator, SyncPhase, SyncProgress,
};
use crate::core::selection::SelectionSet;
use crate::core::{
    AccountSlot, Collection, ConfigProvider, CredentialStore, CredentialValidityChecker, Result,
    SubscriptionApi,
};
use std::sync::Arc;
use std::time::Duration;

/// Final state of a sync run plus the refreshed target collection.
#[derive(Debug)]
pub struct SyncOutcome {
    pub job: SyncJob,
    pub refreshed_target: Option<Collection>,
}

/// Wires accounts, fetching, selection and the orchestrator together.
pub struct SyncEngine<S, V, A>
where
    S: CredentialStore,
    V: CredentialValidityChecker,
    A: SubscriptionApi + 'static,
{
    accounts: AccountService<S, V, A>,
    api: Arc<A>,
    page_size: usize,
    write_spacing: Duration,
}

impl<S, V, A> SyncEngine<S, V, A>
where
    S: CredentialStore,
    V: CredentialValidityChecker,
    A: SubscriptionApi + 'static,
{
    pub fn new<C: ConfigProvider>(store: S, checker: V, api: Arc<A>, config: &C) -> Self {
        Self {
            accounts: AccountService::new(store, checker, Arc::clone(&api)),
            api,
            page_size: config.page_size(),
            write_spacing: config.write_spacing(),
        }
    }

    pub fn accounts(&self) -> &AccountService<S, V, A> {
        &self.accounts
    }

    /// Fetches the full, sorted collection for `slot`.
    pub async fn list(&self, slot: AccountSlot) -> Result<Collection> {
        let credential = self.accounts.load_credential(slot).await?;
        CollectionFetcher::new(Arc::clone(&self.api))
            .with_page_size(self.page_size)
            .fetch_collection(&credential)
            .await
    }

    /// Fetches the source collection and selects `names` (or everything).
    ///
    /// Unknown names are skipped with a warning.
    pub async fn select_from_source(&self, names: &[String], all: bool) -> Result<SelectionSet> {
        let source = self.list(AccountSlot::Source).await?;
        let mut selection = SelectionSet::from_collection(&source);

        if all {
            selection.select_all();
        } else {
            for name in names {
                let name = name.trim().trim_start_matches("r/");
                if selection.is_selected(name) {
                    continue;
                }
                if let Err(e) = selection.toggle(name) {
                    tracing::warn!("⚠️ Skipping r/{}: {}", name, e);
                }
            }
        }

        tracing::info!(
            "☑️ {} of {} source subscriptions selected",
            selection.len(),
            selection.available_len()
        );
        Ok(selection)
    }

    /// Builds the selection for a sync run.
    ///
    /// Both accounts must hold usable credentials before the source is
    /// fetched, and an empty selection is an error.
    pub async fn prepare_selection(&self, names: &[String], all: bool) -> Result<SelectionSet> {
        self.accounts.require_connected().await?;
        let selection = self.select_from_source(names, all).await?;
        self.readiness(&selection).await?.into_result()?;
        Ok(selection)
    }

    /// Names a sync of `selection` would subscribe to, without writing.
    pub async fn plan(&self, selection: &SelectionSet) -> Result<Vec<String>> {
        let target = self.list(AccountSlot::Target).await?;
        Ok(pending_names(&target, &selection.current()))
    }

    pub async fn readiness(&self, selection: &SelectionSet) -> Result<SyncReadiness> {
        self.accounts.sync_readiness(selection.len()).await
    }

    pub async fn sync<F>(&self, selection: &SelectionSet, observer: F) -> Result<SyncOutcome>
    where
        F: FnMut(&SyncProgress),
    {
        let credentials = self.accounts.sync_credentials().await?;
        let orchestrator = SyncOrchestrator::new(Arc::clone(&self.api))
            .with_page_size(self.page_size)
            .with_write_spacing(self.write_spacing);

        let job = orchestrator
            .sync_with_progress(&selection.current(), &credentials, observer)
            .await?;

        let refreshed_target = match job.phase() {
            SyncPhase::Completed | SyncPhase::CompletedWithFailures => {
                match self.list(AccountSlot::Target).await {
                    Ok(collection) => Some(collection),
                    Err(e) => {
                        tracing::warn!("⚠️ Could not refresh target subscriptions: {}", e);
                        None
                    }
                }
            }
            _ => None,
        };

        Ok(SyncOutcome {
            job,
            refreshed_target,
        })
    }
}
