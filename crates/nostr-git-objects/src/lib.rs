// Distributed under the MIT software license

//! Filesystem and git object-store capability traits.
//!
//! These are the two capabilities the clone ladder, merge analyzer and
//! patch applier are written against instead of touching disk or
//! shelling out directly, so every crate above this one can be tested
//! with an in-memory double.

pub mod fs;
pub mod objects;

pub use fs::{Fs, FsError, Metadata, MemoryFs, NativeFs};
pub use objects::{
    CloneOptions, CommitAuthor, CommitInfo, FetchOptions, FetchOutcome, FileChange, MemoryObjectStore,
    ObjectStore, ObjectStoreError, PushOptions, PushOutcome, RemoteRef, ResolveOptions, StatusRow,
    WriteRefOptions,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn seed_commit(oid: &str, parents: &[&str]) -> CommitInfo {
        CommitInfo {
            oid: oid.to_string(),
            parents: parents.iter().map(|s| s.to_string()).collect(),
            author_name: "Ada".into(),
            author_email: "ada@example.com".into(),
            author_time: 0,
            message: format!("commit {oid}"),
        }
    }

    #[tokio::test]
    async fn memory_fs_round_trips() {
        let fs = MemoryFs::new();
        fs.write_file(Path::new("/repo/README.md"), b"hello").await.unwrap();
        assert!(fs.exists(Path::new("/repo/README.md")).await);
        assert_eq!(fs.read_file(Path::new("/repo/README.md")).await.unwrap(), b"hello");
        let children = fs.read_dir(Path::new("/repo")).await.unwrap();
        assert_eq!(children, vec![Path::new("/repo/README.md").to_path_buf()]);
    }

    #[tokio::test]
    async fn memory_fs_missing_path_errors() {
        let fs = MemoryFs::new();
        assert!(matches!(
            fs.read_file(Path::new("/missing")).await,
            Err(FsError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn clone_then_fetch_sees_new_commits() {
        let store = MemoryObjectStore::new();
        store.seed_commit("https://example.com/repo.git", "main", seed_commit("c1", &[]));
        let dest = Path::new("/work/repo");
        store
            .clone_repo("https://example.com/repo.git", dest, CloneOptions::default())
            .await
            .unwrap();
        assert_eq!(
            store
                .resolve_ref(dest, "refs/heads/main", ResolveOptions::default())
                .await
                .unwrap(),
            Some("c1".to_string())
        );

        store.seed_commit("https://example.com/repo.git", "main", seed_commit("c2", &["c1"]));
        let outcome = store.fetch(dest, "origin", FetchOptions::default()).await.unwrap();
        assert_eq!(outcome.updated_refs.len(), 1);
        assert_eq!(outcome.updated_refs[0].oid, "c2");
    }

    #[tokio::test]
    async fn find_merge_base_locates_common_ancestor() {
        let store = MemoryObjectStore::new();
        store.seed_commit("https://example.com/repo.git", "main", seed_commit("root", &[]));
        let dest = Path::new("/work/repo");
        store
            .clone_repo("https://example.com/repo.git", dest, CloneOptions::default())
            .await
            .unwrap();
        // `feature` starts at the same commit as `main`, so their merge base is themselves.
        store
            .write_ref(dest, "refs/heads/feature", "root", WriteRefOptions::default())
            .await
            .unwrap();
        let base = store.find_merge_base(dest, "root", "root").await.unwrap();
        assert_eq!(base, Some("root".to_string()));
    }

    #[tokio::test]
    async fn push_rejects_non_fast_forward_without_force() {
        let store = MemoryObjectStore::new();
        store.seed_commit("https://example.com/repo.git", "main", seed_commit("c1", &[]));
        let dest = Path::new("/work/repo");
        store
            .clone_repo("https://example.com/repo.git", dest, CloneOptions::default())
            .await
            .unwrap();
        // Someone else advances the server branch past what we have locally.
        store.seed_commit("https://example.com/repo.git", "main", seed_commit("c2", &["c1"]));
        store
            .write_ref(dest, "refs/heads/main", "local-only", WriteRefOptions::default())
            .await
            .unwrap();
        let result = store
            .push(dest, "origin", "refs/heads/main:refs/heads/main", PushOptions::default())
            .await;
        assert!(matches!(result, Err(ObjectStoreError::PushRejected(_))));
    }
}
