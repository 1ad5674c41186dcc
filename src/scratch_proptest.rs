//! Property-based tests for scratch store write deduplication.
//!
//! These tests use proptest to generate random write sequences and verify
//! that the filesystem only sees writes whose content differs from the last
//! content written to the same path.

#[cfg(test)]
mod proptest_tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use crate::config::ScratchConfig;
    use crate::filesystem::MemoryFs;
    use crate::scratch::ScratchStore;
    use proptest::prelude::*;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
    }

    fn write_sequence() -> impl Strategy<Value = Vec<(String, String)>> {
        prop::collection::vec(("[ab]/[xyz]\\.txt", "[01]{0,2}"), 0..40)
    }

    proptest! {
        /// Property: filesystem writes equal the number of content changes per path
        #[test]
        fn writes_only_on_content_change(sequence in write_sequence()) {
            let (writes, expected, final_files) = runtime().block_on(async {
                let fs = Arc::new(MemoryFs::new());
                let store = ScratchStore::open(ScratchConfig::new().with_root("/scratch"), fs.clone())
                    .await
                    .unwrap();
                let baseline = fs.write_count();

                let mut last: HashMap<&str, &str> = HashMap::new();
                let mut expected = 0;
                for (path, content) in &sequence {
                    if last.get(path.as_str()) != Some(&content.as_str()) {
                        expected += 1;
                        last.insert(path.as_str(), content.as_str());
                    }
                    store.write_temp(path, content).await.unwrap();
                }

                let final_files: Vec<(String, Option<String>, String)> = last
                    .iter()
                    .map(|(path, content)| {
                        (
                            path.to_string(),
                            fs.read_to_string(format!("/scratch/{}", path)),
                            content.to_string(),
                        )
                    })
                    .collect();
                (fs.write_count() - baseline, expected, final_files)
            });

            prop_assert_eq!(writes, expected);
            for (path, on_disk, content) in final_files {
                prop_assert_eq!(on_disk, Some(content), "content mismatch for {}", path);
            }
        }

        /// Property: stats account for every call
        #[test]
        fn stats_account_for_every_call(sequence in write_sequence()) {
            let stats = runtime().block_on(async {
                let fs = Arc::new(MemoryFs::new());
                let store = ScratchStore::open(ScratchConfig::new().with_root("/scratch"), fs)
                    .await
                    .unwrap();
                for (path, content) in &sequence {
                    store.write_temp(path, content).await.unwrap();
                }
                store.stats()
            });

            prop_assert_eq!(stats.writes + stats.skipped, sequence.len());
        }
    }
}
