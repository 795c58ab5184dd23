#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Cursor;
    use std::path::Path;

    use tempfile::tempdir;

    use crate::aggregate::{aggregate_file, aggregate_reader};
    use crate::error::BenchError;

    fn aggregate(text: &str, trials: usize) -> Result<f64, BenchError> {
        aggregate_reader(Cursor::new(text), trials, Path::new("samples.txt"))
    }

    #[test]
    fn mean_of_identical_samples_is_that_sample() {
        let mean = aggregate("1.0\n1.0\n1.0\n1.0\n1.0\n", 5).expect("aggregate");
        assert_eq!(mean, 1.0);
    }

    #[test]
    fn mean_of_mixed_samples() {
        let mean = aggregate("1.5\n2.5\n3.0\n0.5\n2.5\n", 5).expect("aggregate");
        assert!((mean - 2.0).abs() < 1e-12, "got {}", mean);
    }

    #[test]
    fn trims_whitespace_and_crlf() {
        let mean = aggregate("  0.25 \r\n0.75\r\n", 2).expect("aggregate");
        assert!((mean - 0.5).abs() < 1e-12);
    }

    #[test]
    fn ignores_lines_beyond_trial_count() {
        let mean = aggregate("2.0\n4.0\nnot a number\n", 2).expect("aggregate");
        assert_eq!(mean, 3.0);
    }

    #[test]
    fn single_trial_without_trailing_newline() {
        assert_eq!(aggregate("12.34", 1).expect("aggregate"), 12.34);
    }

    #[test]
    fn too_few_lines_reports_missing_samples() {
        let err = aggregate("1.0\n2.0\n", 5).unwrap_err();
        match err {
            BenchError::MissingSamples { expected, found, .. } => {
                assert_eq!(expected, 5);
                assert_eq!(found, 2);
            }
            other => panic!("expected MissingSamples, got {:?}", other),
        }
    }

    #[test]
    fn unparseable_line_reports_position_and_content() {
        let err = aggregate("1.0\nexit status 2\n3.0\n", 3).unwrap_err();
        match err {
            BenchError::InvalidSample { line, content, .. } => {
                assert_eq!(line, 2);
                assert_eq!(content, "exit status 2");
            }
            other => panic!("expected InvalidSample, got {:?}", other),
        }
    }

    #[test]
    fn empty_line_is_not_a_sample() {
        let err = aggregate("\n1.0\n", 2).unwrap_err();
        assert!(matches!(err, BenchError::InvalidSample { line: 1, .. }));
    }

    #[test]
    fn zero_trials_is_rejected() {
        let err = aggregate("1.0\n", 0).unwrap_err();
        assert!(matches!(err, BenchError::InvalidConfig(_)));
    }

    #[test]
    fn aggregate_file_reads_from_disk() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("big_parfiles_4.txt");
        fs::write(&path, "8.0\n").expect("write");
        assert_eq!(aggregate_file(&path, 1).expect("aggregate"), 8.0);
        assert!(path.exists(), "aggregating must not remove caller-owned files");
    }

    #[test]
    fn aggregate_file_missing_path_is_io_error() {
        let dir = tempdir().expect("tempdir");
        let err = aggregate_file(&dir.path().join("absent.txt"), 1).unwrap_err();
        assert!(matches!(err, BenchError::Io { .. }));
        assert!(err.to_string().contains("absent.txt"));
    }
}
