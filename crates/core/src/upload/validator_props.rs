//! Property-based tests for candidate screening.

use proptest::prelude::*;

use super::error::ValidationError;
use super::types::LocalFile;
use super::validator::{UploadOptions, format_megabytes, screen, validate_size};

/// Strategy for a file name with a common extension.
fn file_name() -> impl Strategy<Value = String> {
    ("[a-z]{1,12}", prop_oneof![Just("png"), Just("jpg"), Just("pdf"), Just("mp4")])
        .prop_map(|(stem, ext)| format!("{stem}.{ext}"))
}

/// Strategy for a candidate of up to `max_len` bytes.
fn candidate(max_len: usize) -> impl Strategy<Value = LocalFile> {
    (file_name(), 0..=max_len)
        .prop_map(|(name, len)| LocalFile::new(name, "application/octet-stream", vec![0u8; len]))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every candidate above the limit is rejected, everything else passes.
    #[test]
    fn prop_size_limit_is_exact(size in 0usize..4096, max in 0u64..4096) {
        let file = LocalFile::new("a.bin", "application/octet-stream", vec![0u8; size]);
        let result = validate_size(&file, max);
        prop_assert_eq!(result.is_err(), size as u64 > max);
    }

    /// No admitted file exceeds the limit, and admitted plus rejected covers
    /// the whole selection when it fits the count limit.
    #[test]
    fn prop_screen_partitions_selection(
        files in prop::collection::vec(candidate(256), 0..=5),
        max_size in 1u64..256,
    ) {
        let options = UploadOptions::default().with_max_size(max_size);
        let total = files.len();
        let oversized = files.iter().filter(|f| f.size() > max_size).count();

        let screening = screen(&options, files);

        prop_assert!(screening.admitted.iter().all(|f| f.size() <= max_size));
        prop_assert_eq!(screening.rejected.len(), oversized);
        prop_assert_eq!(screening.admitted.len() + screening.rejected.len(), total);
        let all_too_large = screening
            .rejected
            .iter()
            .all(|e| matches!(e, ValidationError::FileTooLarge { .. }));
        prop_assert!(all_too_large);
    }

    /// Selections above the count limit admit nothing.
    #[test]
    fn prop_count_limit_rejects_whole_selection(
        files in prop::collection::vec(candidate(8), 1..12),
        max_files in 1usize..6,
    ) {
        let options = UploadOptions::default().with_max_files(max_files);
        let count = files.len();

        let screening = screen(&options, files);

        prop_assert!(screening.admitted.len() <= max_files);
        if count > max_files {
            prop_assert!(screening.admitted.is_empty());
            prop_assert_eq!(
                screening.rejected,
                vec![ValidationError::TooManyFiles { count, max: max_files }]
            );
        }
    }

    /// Screening is deterministic.
    #[test]
    fn prop_screen_is_deterministic(files in prop::collection::vec(candidate(64), 0..=5)) {
        let options = UploadOptions::default().with_max_size(32);
        prop_assert_eq!(screen(&options, files.clone()), screen(&options, files));
    }

    /// The megabyte label always carries two decimals.
    #[test]
    fn prop_megabyte_label_has_two_decimals(bytes in any::<u64>()) {
        let label = format_megabytes(bytes);
        let (_, decimals) = label.split_once('.').unwrap_or_default();
        prop_assert_eq!(decimals.len(), 2);
    }
}
