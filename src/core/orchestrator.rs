use crate::core::fetcher::CollectionFetcher;
use crate::core::{AccountSlot, Collection, Credential, Result, SubscriptionApi};
use crate::utils::error::SyncError;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// 兩次寫入之間的預設間隔，避開遠端 API 的速率限制
pub const DEFAULT_WRITE_SPACING: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    FetchingTarget,
    NothingToDo,
    Applying,
    Completed,
    CompletedWithFailures,
    AbortedBeforeApply,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Applied,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemResult {
    pub name: String,
    pub outcome: ItemOutcome,
}

/// Snapshot handed to progress observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncProgress {
    pub phase: SyncPhase,
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub last: Option<ItemResult>,
}

impl SyncProgress {
    fn phase_only(phase: SyncPhase) -> Self {
        Self {
            phase,
            total: 0,
            completed: 0,
            failed: 0,
            last: None,
        }
    }

    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.completed * 100 + self.total / 2) / self.total) as u8
    }
}

/// Selected names missing from `target`, in selection order, without repeats.
pub fn pending_names(target: &Collection, selection: &[String]) -> Vec<String> {
    let existing: HashSet<&str> = target.names().collect();
    let mut pending: Vec<String> = Vec::new();
    for name in selection {
        if !existing.contains(name.as_str()) && !pending.contains(name) {
            pending.push(name.clone());
        }
    }
    pending
}

/// One reconciliation run against the target account.
#[derive(Debug, Clone)]
pub struct SyncJob {
    to_apply: Vec<String>,
    outcomes: Vec<Option<ItemOutcome>>,
    completed_count: usize,
    failed_count: usize,
    phase: SyncPhase,
}

impl SyncJob {
    fn new(target_items: &Collection, selection: &[String]) -> Self {
        let to_apply = pending_names(target_items, selection);
        let outcomes = vec![None; to_apply.len()];

        Self {
            to_apply,
            outcomes,
            completed_count: 0,
            failed_count: 0,
            phase: SyncPhase::FetchingTarget,
        }
    }

    pub fn to_apply(&self) -> &[String] {
        &self.to_apply
    }

    pub fn total(&self) -> usize {
        self.to_apply.len()
    }

    pub fn completed_count(&self) -> usize {
        self.completed_count
    }

    pub fn failed_count(&self) -> usize {
        self.failed_count
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.completed_count == self.total()
    }

    /// Resolved items in `to_apply` order, independent of completion order.
    pub fn results(&self) -> Vec<ItemResult> {
        self.to_apply
            .iter()
            .zip(&self.outcomes)
            .filter_map(|(name, outcome)| {
                outcome.as_ref().map(|outcome| ItemResult {
                    name: name.clone(),
                    outcome: outcome.clone(),
                })
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<ItemResult> {
        self.results()
            .into_iter()
            .filter(|r| matches!(r.outcome, ItemOutcome::Failed(_)))
            .collect()
    }

    pub fn progress(&self) -> SyncProgress {
        SyncProgress {
            phase: self.phase,
            total: self.total(),
            completed: self.completed_count,
            failed: self.failed_count,
            last: None,
        }
    }

    pub fn summary(&self) -> String {
        match self.phase {
            SyncPhase::NothingToDo => "All selected subreddits are already subscribed.".to_string(),
            SyncPhase::Completed => "Sync completed successfully!".to_string(),
            SyncPhase::CompletedWithFailures => format!(
                "Sync completed with errors: {} of {} subreddits failed to sync.",
                self.failed_count,
                self.total()
            ),
            _ => format!(
                "Subscribing to subreddits... ({}/{})",
                self.completed_count,
                self.total()
            ),
        }
    }

    /// 每個項目只記錄一次；重複的結果會被忽略
    fn record(&mut self, index: usize, outcome: ItemOutcome) -> Option<ItemResult> {
        let slot = self.outcomes.get_mut(index)?;
        if slot.is_some() {
            return None;
        }

        if matches!(outcome, ItemOutcome::Failed(_)) {
            self.failed_count += 1;
        }
        self.completed_count += 1;
        *slot = Some(outcome.clone());

        Some(ItemResult {
            name: self.to_apply[index].clone(),
            outcome,
        })
    }

    fn finish(&mut self) {
        self.phase = if self.failed_count == 0 {
            SyncPhase::Completed
        } else {
            SyncPhase::CompletedWithFailures
        };
    }
}

/// Credentials handed to a sync run; `None` means the slot is not connected.
#[derive(Debug, Clone, Default)]
pub struct SyncCredentials {
    pub source: Option<Credential>,
    pub target: Option<Credential>,
}

pub struct SyncOrchestrator<A: SubscriptionApi + 'static> {
    api: Arc<A>,
    write_spacing: Duration,
    page_size: usize,
}

impl<A: SubscriptionApi + 'static> SyncOrchestrator<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            write_spacing: DEFAULT_WRITE_SPACING,
            page_size: crate::core::fetcher::MAX_PAGE_SIZE,
        }
    }

    pub fn with_write_spacing(mut self, write_spacing: Duration) -> Self {
        self.write_spacing = write_spacing;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub async fn sync(
        &self,
        selection: &[String],
        credentials: &SyncCredentials,
    ) -> Result<SyncJob> {
        self.sync_with_progress(selection, credentials, |_| {}).await
    }

    /// Reconciles `selection` against the target account.
    ///
    /// Preconditions are checked before any network call. A failed target
    /// fetch is returned as `Err` and no writes are issued. Once writes have
    /// started the job always runs to completion; individual write failures
    /// are recorded in the job instead of aborting it.
    pub async fn sync_with_progress<F>(
        &self,
        selection: &[String],
        credentials: &SyncCredentials,
        mut observer: F,
    ) -> Result<SyncJob>
    where
        F: FnMut(&SyncProgress),
    {
        if selection.is_empty() {
            return Err(SyncError::EmptySelection);
        }
        if credentials.source.is_none() {
            return Err(SyncError::MissingCredential {
                slot: AccountSlot::Source,
            });
        }
        let target = credentials
            .target
            .as_ref()
            .ok_or(SyncError::MissingCredential {
                slot: AccountSlot::Target,
            })?;

        observer(&SyncProgress::phase_only(SyncPhase::FetchingTarget));
        tracing::info!("🔄 Preparing to sync {} selected subreddits...", selection.len());

        let fetcher = CollectionFetcher::new(Arc::clone(&self.api)).with_page_size(self.page_size);
        let target_items = match fetcher.fetch_collection(target).await {
            Ok(collection) => collection,
            Err(e) => {
                tracing::error!("❌ Failed to fetch target subscriptions: {}", e);
                observer(&SyncProgress::phase_only(SyncPhase::AbortedBeforeApply));
                return Err(e);
            }
        };

        let mut job = SyncJob::new(&target_items, selection);

        if job.to_apply.is_empty() {
            job.phase = SyncPhase::NothingToDo;
            tracing::info!("✅ {}", job.summary());
            observer(&job.progress());
            return Ok(job);
        }

        job.phase = SyncPhase::Applying;
        tracing::info!("📤 Subscribing to {} subreddits...", job.total());
        observer(&job.progress());

        self.apply(&mut job, &target.token, &mut observer).await;

        job.finish();
        match job.phase {
            SyncPhase::Completed => tracing::info!("✅ {}", job.summary()),
            _ => tracing::warn!("⚠️ {}", job.summary()),
        }
        observer(&job.progress());

        Ok(job)
    }

    /// Starts one write per item at `index × write_spacing` from now.
    ///
    /// Writes run as separate tasks and may overlap; only this task touches
    /// the job, so counters need no locking.
    async fn apply<F>(&self, job: &mut SyncJob, token: &str, observer: &mut F)
    where
        F: FnMut(&SyncProgress),
    {
        let started = Instant::now();
        let mut writes = JoinSet::new();

        for (index, name) in job.to_apply.iter().enumerate() {
            let api = Arc::clone(&self.api);
            let token = token.to_string();
            let name = name.clone();
            let start_at = started + self.write_spacing * index as u32;

            writes.spawn(async move {
                tokio::time::sleep_until(start_at).await;
                tracing::debug!("📤 Subscribing to r/{}", name);
                (index, api.subscribe(&token, &name).await)
            });
        }

        while let Some(joined) = writes.join_next().await {
            let (index, outcome) = match joined {
                Ok((index, Ok(()))) => (index, ItemOutcome::Applied),
                Ok((index, Err(e))) => {
                    tracing::warn!("❌ Failed to subscribe to r/{}: {}", job.to_apply[index], e);
                    (index, ItemOutcome::Failed(e.to_string()))
                }
                Err(e) => {
                    // 任務 panic 時無法得知索引，留待下方補記
                    tracing::error!("❌ Subscribe task did not complete: {}", e);
                    continue;
                }
            };

            if let Some(result) = job.record(index, outcome) {
                let mut progress = job.progress();
                progress.last = Some(result);
                observer(&progress);
            }
        }

        let unresolved: Vec<usize> = job
            .outcomes
            .iter()
            .enumerate()
            .filter(|(_, outcome)| outcome.is_none())
            .map(|(index, _)| index)
            .collect();
        for index in unresolved {
            if let Some(result) =
                job.record(index, ItemOutcome::Failed("write task aborted".to_string()))
            {
                let mut progress = job.progress();
                progress.last = Some(result);
                observer(&progress);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AccountIdentity, CollectionItem, CollectionPage};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    /// 記錄呼叫的假 API；目標帳號清單固定為單頁
    #[derive(Default)]
    struct FakeApi {
        target: Vec<String>,
        target_fetch_status: Option<u16>,
        failing: HashMap<String, u16>,
        panicking: Option<String>,
        fetch_calls: AtomicUsize,
        writes: Mutex<Vec<(String, Duration)>>,
        started: Mutex<Option<Instant>>,
    }

    impl FakeApi {
        fn with_target(names: &[&str]) -> Self {
            Self {
                target: names.iter().map(|n| n.to_string()).collect(),
                ..Default::default()
            }
        }

        fn failing(mut self, name: &str, status: u16) -> Self {
            self.failing.insert(name.to_string(), status);
            self
        }

        fn network_calls(&self) -> usize {
            self.fetch_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl SubscriptionApi for FakeApi {
        async fn fetch_page(
            &self,
            _token: &str,
            _cursor: Option<&str>,
            _page_size: usize,
        ) -> Result<CollectionPage> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            *self.started.lock().await = Some(Instant::now());
            if let Some(status) = self.target_fetch_status {
                return Err(SyncError::HttpError { status });
            }
            Ok(CollectionPage {
                items: self.target.iter().map(CollectionItem::new).collect(),
                next_cursor: None,
            })
        }

        async fn subscribe(&self, _token: &str, name: &str) -> Result<()> {
            let offset = self
                .started
                .lock()
                .await
                .map(|s| s.elapsed())
                .unwrap_or_default();
            self.writes.lock().await.push((name.to_string(), offset));

            if self.panicking.as_deref() == Some(name) {
                panic!("simulated crash for {}", name);
            }
            match self.failing.get(name) {
                Some(status) => Err(SyncError::HttpError { status: *status }),
                None => Ok(()),
            }
        }

        async fn fetch_identity(&self, _token: &str) -> Result<AccountIdentity> {
            Ok(AccountIdentity {
                username: "target_user".to_string(),
            })
        }
    }

    fn credentials() -> SyncCredentials {
        SyncCredentials {
            source: Some(Credential::new(AccountSlot::Source, "source-token")),
            target: Some(Credential::new(AccountSlot::Target, "target-token")),
        }
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_to_apply_skips_existing_target_subscriptions() {
        let api = Arc::new(FakeApi::with_target(&["B"]));
        let orchestrator = SyncOrchestrator::new(api.clone());

        let job = orchestrator
            .sync(&names(&["A", "B", "C"]), &credentials())
            .await
            .unwrap();

        assert_eq!(job.to_apply(), &names(&["A", "C"])[..]);
        assert_eq!(job.phase(), SyncPhase::Completed);
        assert_eq!(job.completed_count(), 2);
        assert_eq!(job.failed_count(), 0);

        let mut written: Vec<String> =
            api.writes.lock().await.iter().map(|(n, _)| n.clone()).collect();
        written.sort();
        assert_eq!(written, names(&["A", "C"]));
    }

    #[test]
    fn test_pending_names_keeps_selection_order_and_drops_repeats() {
        let target = Collection::from_fetched(
            AccountSlot::Target,
            vec![CollectionItem::new("b"), CollectionItem::new("d")],
        );

        let pending = pending_names(&target, &names(&["c", "b", "a", "c", "d"]));

        assert_eq!(pending, names(&["c", "a"]));
        assert!(pending_names(&target, &names(&["d"])).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_to_do_issues_no_writes() {
        let api = Arc::new(FakeApi::with_target(&["A", "B", "C"]));
        let orchestrator = SyncOrchestrator::new(api.clone());

        let job = orchestrator
            .sync(&names(&["A", "B", "C"]), &credentials())
            .await
            .unwrap();

        assert_eq!(job.phase(), SyncPhase::NothingToDo);
        assert_eq!(job.total(), 0);
        assert_eq!(job.completed_count(), 0);
        assert!(api.writes.lock().await.is_empty());
        assert_eq!(job.summary(), "All selected subreddits are already subscribed.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_failure_is_recorded_per_item() {
        let api = Arc::new(FakeApi::with_target(&[]).failing("B", 403));
        let orchestrator = SyncOrchestrator::new(api);

        let job = orchestrator
            .sync(&names(&["A", "B", "C"]), &credentials())
            .await
            .unwrap();

        assert_eq!(job.phase(), SyncPhase::CompletedWithFailures);
        assert_eq!(job.completed_count(), 3);
        assert_eq!(job.failed_count(), 1);

        let failures = job.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].name, "B");
        assert_eq!(
            job.summary(),
            "Sync completed with errors: 1 of 3 subreddits failed to sync."
        );

        let results = job.results();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].outcome, ItemOutcome::Applied);
        assert_eq!(results[2].outcome, ItemOutcome::Applied);
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_are_staggered_by_spacing() {
        let api = Arc::new(FakeApi::with_target(&[]));
        let orchestrator = SyncOrchestrator::new(api.clone());

        orchestrator
            .sync(&names(&["A", "B", "C"]), &credentials())
            .await
            .unwrap();

        let writes = api.writes.lock().await;
        let offset_of = |name: &str| {
            writes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, offset)| *offset)
                .unwrap()
        };
        assert_eq!(offset_of("A"), Duration::ZERO);
        assert_eq!(offset_of("B"), Duration::from_millis(500));
        assert_eq!(offset_of("C"), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_selection_fails_before_network() {
        let api = Arc::new(FakeApi::with_target(&[]));
        let orchestrator = SyncOrchestrator::new(api.clone());

        let err = orchestrator.sync(&[], &credentials()).await.unwrap_err();

        assert!(matches!(err, SyncError::EmptySelection));
        assert_eq!(api.network_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_credentials_fail_before_network() {
        let api = Arc::new(FakeApi::with_target(&[]));
        let orchestrator = SyncOrchestrator::new(api.clone());

        let mut no_target = credentials();
        no_target.target = None;
        let err = orchestrator.sync(&names(&["A"]), &no_target).await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::MissingCredential {
                slot: AccountSlot::Target
            }
        ));

        let mut no_source = credentials();
        no_source.source = None;
        let err = orchestrator.sync(&names(&["A"]), &no_source).await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::MissingCredential {
                slot: AccountSlot::Source
            }
        ));

        assert_eq!(api.network_calls(), 0);
        assert!(api.writes.lock().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_target_fetch_failure_aborts_before_writes() {
        let api = Arc::new(FakeApi {
            target_fetch_status: Some(401),
            ..Default::default()
        });
        let orchestrator = SyncOrchestrator::new(api.clone());
        let mut phases = Vec::new();

        let err = orchestrator
            .sync_with_progress(&names(&["A"]), &credentials(), |p| phases.push(p.phase))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::HttpError { status: 401 }));
        assert!(api.writes.lock().await.is_empty());
        assert_eq!(
            phases,
            vec![SyncPhase::FetchingTarget, SyncPhase::AbortedBeforeApply]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_reports_every_resolution() {
        let api = Arc::new(FakeApi::with_target(&[]).failing("A", 500));
        let orchestrator = SyncOrchestrator::new(api);
        let mut snapshots = Vec::new();

        orchestrator
            .sync_with_progress(&names(&["A", "B"]), &credentials(), |p| {
                snapshots.push(p.clone())
            })
            .await
            .unwrap();

        let phases: Vec<SyncPhase> = snapshots.iter().map(|p| p.phase).collect();
        assert_eq!(
            phases,
            vec![
                SyncPhase::FetchingTarget,
                SyncPhase::Applying,
                SyncPhase::Applying,
                SyncPhase::Applying,
                SyncPhase::CompletedWithFailures,
            ]
        );

        let last = snapshots.last().unwrap();
        assert_eq!((last.completed, last.failed, last.total), (2, 1, 2));
        assert_eq!(last.percent(), 100);
        assert!(snapshots[2].last.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_write_counts_as_failure() {
        let api = Arc::new(FakeApi {
            panicking: Some("B".to_string()),
            ..Default::default()
        });
        let orchestrator = SyncOrchestrator::new(api);

        let job = orchestrator
            .sync(&names(&["A", "B"]), &credentials())
            .await
            .unwrap();

        assert!(job.is_finished());
        assert_eq!(job.failed_count(), 1);
        assert_eq!(job.failures()[0].name, "B");
    }
}
