// Distributed under the MIT software license

use std::path::PathBuf;
use std::sync::Arc;

use nostr_git::prelude::*;
use nostr_git_objects::CommitInfo;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let store = Arc::new(MemoryObjectStore::new());
    store.seed_commit(
        "https://example.com/alice/widgets.git",
        "main",
        CommitInfo {
            oid: "deadbeef".into(),
            parents: vec![],
            author_name: "alice".into(),
            author_email: "alice@example.com".into(),
            author_time: 0,
            message: "initial commit".into(),
        },
    );

    let fs = Arc::new(MemoryFs::new());
    let cache_store = Arc::new(MemoryCacheStore::new());
    let event_io = Arc::new(MemoryEventIO::new("wss://relay.example"));

    let engine = RepoEngine::new(
        store,
        fs,
        cache_store,
        event_io,
        PathBuf::from("/tmp/nostr-git-demo"),
        EngineConfig::from_env(),
    );

    let level = engine
        .smart_initialize_repo(
            "alice/widgets",
            &["https://example.com/alice/widgets.git".to_string()],
            "main",
            false,
            0,
        )
        .await?;

    println!("alice/widgets is now at clone level {level:?}");
    Ok(())
}
