//! Tests for per-file patch progress tracking

#[cfg(test)]
mod tests {
    use patchmaker::io::configuration::MAX_INDIVIDUAL_PROGRESS_BARS;
    use patchmaker::io::progress::{FileState, ProgressManager};
    use std::path::Path;

    // Tests a full single-file lifecycle runs without a terminal
    // Verified by panicking on bars that were never drawn
    #[test]
    fn test_progress_manager_lifecycle() {
        let mut pm = ProgressManager::new();

        pm.initialize(1);
        pm.start_file(0, Path::new("cells.png"), 10);
        pm.update_patches(0, 5);
        pm.complete_file(0);
        pm.finish();

        assert_eq!(pm.file_states().len(), 1);
    }

    // Tests default construction matches new
    // Verified by pre-populating state in Default
    #[test]
    fn test_progress_manager_default() {
        let pm = ProgressManager::default();

        assert!(pm.file_states().is_empty());
    }

    // Tests started files record their name and patch total
    // Verified by storing the full path instead of the file name
    #[test]
    fn test_start_file_records_state() {
        let mut pm = ProgressManager::new();
        pm.initialize(2);

        pm.start_file(1, Path::new("dir/second.png"), 40);

        assert_eq!(pm.file_states().len(), 2);
        assert_eq!(pm.file_states()[0], FileState::default());
        assert_eq!(
            pm.file_states()[1],
            FileState {
                name: "second.png".to_string(),
                patches_done: 0,
                patches_total: 40,
            }
        );
    }

    // Tests progress updates are clamped to the patch total
    // Verified by storing the raw update value
    #[test]
    fn test_update_patches_clamped() {
        let mut pm = ProgressManager::new();
        pm.initialize(1);
        pm.start_file(0, Path::new("a.png"), 12);

        pm.update_patches(0, 7);
        assert_eq!(pm.file_states()[0].patches_done, 7);

        pm.update_patches(0, 100);
        assert_eq!(pm.file_states()[0].patches_done, 12);

        // Unknown files are ignored
        pm.update_patches(5, 1);
        assert_eq!(pm.file_states().len(), 1);
    }

    // Tests completion marks the file and fills its progress
    // Verified by leaving patches_done untouched on completion
    #[test]
    fn test_complete_file() {
        let mut pm = ProgressManager::new();
        pm.initialize(1);
        pm.start_file(0, Path::new("done.png"), 30);

        pm.complete_file(0);

        let state = &pm.file_states()[0];
        assert!(state.name.ends_with("done.png"));
        assert_ne!(state.name, "done.png");
        assert_eq!(state.patches_done, 30);
    }

    // Tests batches larger than the visible bars are handled
    // Verified by allocating one bar per file
    #[test]
    fn test_large_batch() {
        let file_count = MAX_INDIVIDUAL_PROGRESS_BARS * 3;
        let mut pm = ProgressManager::new();
        pm.initialize(file_count);

        for index in 0..file_count {
            pm.start_file(index, Path::new(&format!("file{index}.png")), index + 1);
            pm.update_patches(index, index);
            pm.complete_file(index);
        }
        pm.finish();

        assert_eq!(pm.file_states().len(), file_count);
        assert!(
            pm.file_states()
                .iter()
                .all(|state| state.patches_done == state.patches_total)
        );
    }
}
