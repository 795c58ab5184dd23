#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::fs::{self, File};
    use std::io::Write;
    use std::path::Path;

    use tempfile::tempdir;

    use crate::collector::TrialRunner;
    use crate::config::{BenchConfig, ChartConfig, WorkerConfig};
    use crate::error::{BenchError, Result};
    use crate::orchestrator::Orchestrator;
    use crate::worker::{Invocation, Parallelism};

    /// Answers each trial with `respond(args, call_index)` and records the calls.
    struct FakeWorker<F> {
        respond: F,
        calls: RefCell<Vec<Vec<String>>>,
    }

    impl<F: Fn(&[String], usize) -> String> FakeWorker<F> {
        fn new(respond: F) -> Self {
            Self {
                respond,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl<F: Fn(&[String], usize) -> String> TrialRunner for FakeWorker<F> {
        fn run_trial(&self, invocation: &Invocation, mut stdout: File) -> Result<()> {
            let index = self.calls.borrow().len();
            self.calls.borrow_mut().push(invocation.args.clone());
            let line = (self.respond)(&invocation.args, index);
            stdout
                .write_all(line.as_bytes())
                .map_err(|e| BenchError::io("stdout", e))
        }
    }

    fn config(work_dir: &Path) -> BenchConfig {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        BenchConfig {
            trials: 2,
            threads: vec![2, 4],
            workloads: strings(&["a", "b"]),
            work_dir: work_dir.to_path_buf(),
            worker: WorkerConfig {
                program: "fake-worker".to_string(),
                args: Vec::new(),
                baseline_args: strings(&["s", "{workload}"]),
                parallel_args: strings(&["p", "{workload}", "{threads}"]),
                cwd: None,
            },
            chart: ChartConfig::default(),
        }
    }

    /// Baseline takes 8s; `t` threads take 8/t seconds.
    fn ideal_scaling(args: &[String], _call: usize) -> String {
        match args {
            [mode, _] if mode == "s" => "8.00\n".to_string(),
            [mode, _, threads] if mode == "p" => {
                let t: f64 = threads.parse().expect("thread arg");
                format!("{}\n", 8.0 / t)
            }
            other => panic!("unexpected args {:?}", other),
        }
    }

    fn leftover_files(dir: &Path) -> usize {
        fs::read_dir(dir).expect("read_dir").count()
    }

    #[test]
    fn run_computes_speedups_per_workload() {
        let dir = tempdir().expect("tempdir");
        let config = config(dir.path());
        let worker = FakeWorker::new(ideal_scaling);
        let report = Orchestrator::new(&config, &worker).run().expect("run");

        assert_eq!(report.trials, 2);
        assert_eq!(report.threads, vec![2, 4]);
        let labels: Vec<&str> = report.workloads.iter().map(|w| w.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "b"]);
        for workload in &report.workloads {
            assert_eq!(workload.baseline, 8.0);
            let speedups: Vec<Option<f64>> = workload.points.iter().map(|p| p.speedup.ratio()).collect();
            assert_eq!(speedups, vec![Some(2.0), Some(4.0)]);
        }
        assert_eq!(leftover_files(dir.path()), 0);
    }

    #[test]
    fn runs_are_sequential_in_plan_order() {
        let dir = tempdir().expect("tempdir");
        let config = config(dir.path());
        let worker = FakeWorker::new(ideal_scaling);
        let orchestrator = Orchestrator::new(&config, &worker);
        orchestrator.run().expect("run");

        let expected: Vec<Vec<String>> = orchestrator
            .plan()
            .into_iter()
            .flat_map(|(_, _, inv)| std::iter::repeat_n(inv.args, config.trials))
            .collect();
        assert_eq!(*worker.calls.borrow(), expected);
        assert_eq!(expected.len(), 2 * 3 * 2);
    }

    #[test]
    fn plan_lists_baseline_then_thread_counts() {
        let dir = tempdir().expect("tempdir");
        let config = config(dir.path());
        let worker = FakeWorker::new(ideal_scaling);
        let plan = Orchestrator::new(&config, &worker).plan();
        let order: Vec<(String, Parallelism)> = plan.iter().map(|(w, p, _)| (w.clone(), *p)).collect();
        assert_eq!(
            order,
            vec![
                ("a".to_string(), Parallelism::Baseline),
                ("a".to_string(), Parallelism::Threads(2)),
                ("a".to_string(), Parallelism::Threads(4)),
                ("b".to_string(), Parallelism::Baseline),
                ("b".to_string(), Parallelism::Threads(2)),
                ("b".to_string(), Parallelism::Threads(4)),
            ]
        );
        assert_eq!(plan[2].2.args, vec!["p", "a", "4"]);
        assert!(worker.calls.borrow().is_empty(), "planning must not run the worker");
    }

    #[test]
    fn measure_averages_trials() {
        let dir = tempdir().expect("tempdir");
        let mut config = config(dir.path());
        config.trials = 4;
        let worker = FakeWorker::new(|_: &[String], call: usize| format!("{}\n", [1.0, 2.0, 3.0, 6.0][call]));
        let mean = Orchestrator::new(&config, &worker)
            .measure("a", Parallelism::Baseline)
            .expect("measure");
        assert_eq!(mean, 3.0);
    }

    #[test]
    fn single_trial_configuration_runs_once_per_point() {
        let dir = tempdir().expect("tempdir");
        let mut config = config(dir.path());
        config.trials = 1;
        config.workloads.truncate(1);
        let worker = FakeWorker::new(ideal_scaling);
        Orchestrator::new(&config, &worker).run().expect("run");
        assert_eq!(worker.calls.borrow().len(), 3);
    }

    #[test]
    fn zero_parallel_time_is_reported_undefined() {
        let dir = tempdir().expect("tempdir");
        let config = config(dir.path());
        let worker = FakeWorker::new(|args: &[String], _| {
            if args.len() == 3 && args[2] == "4" {
                "0.00\n".to_string()
            } else {
                ideal_scaling(args, 0)
            }
        });
        let report = Orchestrator::new(&config, &worker).run().expect("run");
        let point = &report.workloads[0].points[1];
        assert_eq!(point.threads, 4);
        assert!(!point.speedup.is_defined());
        assert_eq!(report.undefined_points(), 2);
    }

    #[test]
    fn non_numeric_output_aborts_and_cleans_up() {
        let dir = tempdir().expect("tempdir");
        let config = config(dir.path());
        let worker = FakeWorker::new(|args: &[String], _| {
            if args.len() == 3 && args[2] == "2" {
                "panic: deadlock\n".to_string()
            } else {
                ideal_scaling(args, 0)
            }
        });
        let err = Orchestrator::new(&config, &worker).run().unwrap_err();
        assert!(matches!(err, BenchError::InvalidSample { line: 1, .. }), "got {:?}", err);
        assert_eq!(leftover_files(dir.path()), 0);
        // baseline (2 trials) + first parallel configuration (2 trials), then abort
        assert_eq!(worker.calls.borrow().len(), 4);
    }

    #[test]
    fn missing_output_aborts_and_cleans_up() {
        let dir = tempdir().expect("tempdir");
        let config = config(dir.path());
        let worker = FakeWorker::new(|_: &[String], call: usize| {
            if call == 0 { "1.0\n".to_string() } else { String::new() }
        });
        let err = Orchestrator::new(&config, &worker).run().unwrap_err();
        assert!(matches!(err, BenchError::MissingSamples { expected: 2, found: 1, .. }));
        assert_eq!(leftover_files(dir.path()), 0);
    }

    #[test]
    fn run_validates_configuration_first() {
        let dir = tempdir().expect("tempdir");
        let mut config = config(dir.path());
        config.trials = 0;
        let worker = FakeWorker::new(ideal_scaling);
        let err = Orchestrator::new(&config, &worker).run().unwrap_err();
        assert!(matches!(err, BenchError::InvalidConfig(_)));
        assert!(worker.calls.borrow().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn runs_a_real_worker_script() {
        use crate::collector::CommandRunner;

        let dir = tempdir().expect("tempdir");
        let script = dir.path().join("worker.sh");
        fs::write(
            &script,
            "#!/bin/sh\nif [ \"$1\" = s ]; then echo 12.0; else echo \"$3\" | awk '{ print 12.0 / $1 }'; fi\n",
        )
        .expect("write script");

        let work_dir = dir.path().join("scratch");
        fs::create_dir(&work_dir).expect("mkdir");
        let mut config = config(&work_dir);
        config.threads = vec![2, 4, 6];
        config.workloads = vec!["xsmall".to_string()];
        config.worker.program = "sh".to_string();
        config.worker.args = vec![script.to_string_lossy().into_owned()];

        let report = Orchestrator::new(&config, CommandRunner).run().expect("run");
        let speedups: Vec<f64> = report.workloads[0]
            .points
            .iter()
            .map(|p| p.speedup.ratio().expect("defined"))
            .collect();
        for (got, want) in speedups.iter().zip([2.0, 4.0, 6.0]) {
            assert!((got - want).abs() < 1e-9, "got {} want {}", got, want);
        }
        assert_eq!(leftover_files(&work_dir), 0);
    }
}
