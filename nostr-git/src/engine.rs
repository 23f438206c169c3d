// Distributed under the MIT software license

//! `RepoEngine`: the façade that wires every capability crate together
//! into the one object a caller actually holds, mirroring how the
//! teacher's `Client` sits on top of `RelayPool`/`NostrDatabase`/`Keys`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use nostr::Event;
use nostr_git_cache::{CacheStore, DataLevel, RepoCache};
use nostr_git_clone::{CloneLadder, PreferredUrlMap};
use nostr_git_core::{EventIO, PublishOutcome, TransportError};
use nostr_git_merge::{
    ApplyOutcome, MergeAnalysisResult, MergeAnalyzer, PatchApplier, PatchCommitInfo, PatchInput, PreflightOptions,
    PreflightResult, RemoteHeadProbe,
};
use nostr_git_objects::{Fs, ObjectStore};
use nostr_git_vendor::GitServiceApi;
use nostr::Timestamp;
use tracing::instrument;

use crate::config::EngineConfig;
use crate::error::Error;

/// Everything a caller needs to drive a repo through the clone ladder,
/// merge analysis, safe push and vendor API surface behind one handle.
///
/// Holds no per-repo state of its own beyond what its components
/// (`RepoCache`, `CloneLadder`) already own; wrap in an `Arc` to share
/// across tasks, the way callers share a `CloneLadder` today.
pub struct RepoEngine {
    store: Arc<dyn ObjectStore>,
    fs: Arc<dyn Fs>,
    cache: Arc<RepoCache>,
    ladder: CloneLadder,
    analyzer: MergeAnalyzer,
    applier: PatchApplier,
    event_io: Arc<dyn EventIO>,
    vendors: HashMap<&'static str, Arc<dyn GitServiceApi>>,
    config: EngineConfig,
}

impl RepoEngine {
    /// Assemble an engine from its capabilities. `root_dir` is where the
    /// clone ladder materializes repos on disk (§6 `<rootDir>/<canonicalId>`).
    pub fn new(
        store: Arc<dyn ObjectStore>,
        fs: Arc<dyn Fs>,
        cache_store: Arc<dyn CacheStore>,
        event_io: Arc<dyn EventIO>,
        root_dir: PathBuf,
        config: EngineConfig,
    ) -> Self {
        let cache = Arc::new(RepoCache::new(cache_store, config.cache_mode()));
        let preferred = Arc::new(PreferredUrlMap::new());
        let ladder = CloneLadder::new(store.clone(), cache.clone(), preferred, root_dir);
        let analyzer = MergeAnalyzer::new(store.clone());
        let applier = PatchApplier::new(store.clone());
        Self {
            store,
            fs,
            cache,
            ladder,
            analyzer,
            applier,
            event_io,
            vendors: HashMap::new(),
            config,
        }
    }

    /// The configuration this engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The repo cache backing this engine's clone ladder.
    pub fn cache(&self) -> &RepoCache {
        &self.cache
    }

    /// Register a vendor adapter under its vendor tag (`"github"`,
    /// `"gitlab"`, `"gitea"`, `"bitbucket"`, `"native-relay"`). Replaces
    /// any adapter already registered under the same tag.
    pub fn register_vendor(&mut self, adapter: Arc<dyn GitServiceApi>) {
        self.vendors.insert(adapter.vendor(), adapter);
    }

    /// Look up a previously registered vendor adapter by tag.
    pub fn vendor(&self, tag: &str) -> Option<Arc<dyn GitServiceApi>> {
        self.vendors.get(tag).cloned()
    }

    /// §4.G `initializeRepo`: bring a repo to at least `DataLevel::Refs`.
    #[instrument(skip(self, clone_urls))]
    pub async fn initialize_repo(&self, repo_id: &str, clone_urls: &[String], now: i64) -> Result<DataLevel, Error> {
        Ok(self.ladder.initialize_repo(repo_id, clone_urls, now).await?)
    }

    /// §4.G `ensureShallowClone`.
    #[instrument(skip(self, clone_urls))]
    pub async fn ensure_shallow_clone(
        &self,
        repo_id: &str,
        clone_urls: &[String],
        branch_hint: Option<&str>,
        now: i64,
    ) -> Result<DataLevel, Error> {
        Ok(self.ladder.ensure_shallow_clone(repo_id, clone_urls, branch_hint, now).await?)
    }

    /// §4.G `ensureFullClone`.
    #[instrument(skip(self, clone_urls))]
    pub async fn ensure_full_clone(&self, repo_id: &str, clone_urls: &[String], branch: &str, now: i64) -> Result<DataLevel, Error> {
        Ok(self.ladder.ensure_full_clone(repo_id, clone_urls, branch, now).await?)
    }

    /// §4.G `smartInitializeRepo`: cache-aware entry point most callers
    /// should use instead of the three rungs above directly.
    #[instrument(skip(self, clone_urls))]
    pub async fn smart_initialize_repo(
        &self,
        repo_id: &str,
        clone_urls: &[String],
        branch: &str,
        force: bool,
        now: i64,
    ) -> Result<DataLevel, Error> {
        Ok(self.ladder.smart_initialize_repo(repo_id, clone_urls, branch, force, now).await?)
    }

    /// §4.G `deleteRepo`: drop the local clone and its cache record.
    pub async fn delete_repo(&self, repo_id: &str) -> Result<(), Error> {
        Ok(self.ladder.delete_repo(repo_id).await?)
    }

    /// §4.I `analyzePatchMergeability`.
    pub async fn analyze_patch(&self, dest: &Path, patch: &PatchInput, target_branch: &str) -> Result<MergeAnalysisResult, Error> {
        Ok(self.analyzer.analyze(dest, patch, target_branch).await?)
    }

    /// §4.J `applyPatchAndPush`.
    pub async fn apply_and_push_patch(&self, dest: &Path, target_branch: &str, patch: &PatchCommitInfo) -> Result<ApplyOutcome, Error> {
        Ok(self.applier.apply_and_push(dest, target_branch, patch).await?)
    }

    /// §4.K `safePush` preflight. `probe` is the caller's already-resolved
    /// remote-head lookup (this engine performs no network I/O itself
    /// beyond what the clone ladder and object store already do).
    pub async fn safe_push_preflight(
        &self,
        dest: &Path,
        options: &PreflightOptions,
        now: Timestamp,
    ) -> Result<PreflightResult, Error> {
        let cache_record = self.cache.get_repo(&canonical_repo_key(dest)).await.ok().flatten();
        let probe = if options.block_if_remote_ahead && options.provider != nostr_git_merge::NATIVE_RELAY_PROVIDER {
            Some(self.resolve_remote_head_probe(&options.provider).await)
        } else {
            None
        };
        Ok(nostr_git_merge::safe_push_preflight(
            self.fs.as_ref(),
            self.store.as_ref(),
            dest,
            options,
            cache_record.as_ref(),
            probe.as_ref(),
            now,
        )
        .await?)
    }

    async fn resolve_remote_head_probe(&self, _provider: &str) -> RemoteHeadProbe {
        // The engine has no standalone "resolve remote HEAD" primitive of
        // its own; callers that need a non-default probe should call
        // `nostr_git_merge::safe_push_preflight` directly with one they
        // obtained from their vendor adapter. Defaulting to permissive
        // matches §4.K's "on all-URL CORS failure it is permissive".
        RemoteHeadProbe::AllUrlsFailed
    }

    /// §4.B `fetchEvents`.
    pub async fn fetch_events(&self, filters: &[nostr::Filter]) -> Result<Vec<Event>, Error> {
        Ok(self.event_io.fetch_events(filters).await.map_err(transport_err)?)
    }

    /// §4.B `publishEvent`.
    pub async fn publish_event(&self, event: Event) -> Result<PublishOutcome, Error> {
        Ok(self.event_io.publish_event(event).await.map_err(transport_err)?)
    }
}

fn transport_err(e: TransportError) -> Error {
    Error::Transport(e)
}

/// The cache key a working-tree path maps back to: the last two path
/// components, joined as `<owner>/<repo>` (mirrors §6's canonical id
/// layout `<rootDir>/<canonicalId>` read in reverse).
fn canonical_repo_key(dest: &Path) -> String {
    let mut components: Vec<&str> = dest.iter().filter_map(|c| c.to_str()).collect();
    let repo = components.pop().unwrap_or_default();
    let owner = components.pop().unwrap_or_default();
    format!("{owner}/{repo}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_repo_key_takes_the_last_two_components() {
        assert_eq!(canonical_repo_key(Path::new("/data/repos/alice/widgets")), "alice/widgets");
    }
}
