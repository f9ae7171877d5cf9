//! Parallel package runner.
//!
//! Workers pull package indices from a shared queue and send back
//! `(index, outcome)` pairs; results are placed by index so the output
//! order never depends on scheduling.

use crossbeam::channel;
use tracing::debug;

use super::{Analyzer, PackagePass, PackageReport, PassOutcome};
use crate::loader::{Package, Program};

pub(super) fn run(
    analyzer: &Analyzer,
    program: &Program,
    packages: &[&Package],
    jobs: usize,
) -> Vec<PackageReport> {
    let workers = worker_count(jobs, packages.len());
    debug!(packages = packages.len(), workers, "running analysis");

    let mut outcomes: Vec<Option<PassOutcome>> = vec![None; packages.len()];
    if workers <= 1 {
        for (slot, &package) in outcomes.iter_mut().zip(packages) {
            *slot = Some(analyzer.analyze(&PackagePass { program, package }));
        }
    } else {
        let (task_tx, task_rx) = channel::unbounded::<usize>();
        let (result_tx, result_rx) = channel::unbounded::<(usize, PassOutcome)>();
        for index in 0..packages.len() {
            // Receiver is alive until the scope below ends.
            let _ = task_tx.send(index);
        }
        drop(task_tx);

        let scoped = crossbeam::scope(|scope| {
            for _ in 0..workers {
                let task_rx = task_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move |_| {
                    for index in task_rx.iter() {
                        let pass = PackagePass {
                            program,
                            package: packages[index],
                        };
                        if result_tx.send((index, analyzer.analyze(&pass))).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        if let Err(panic) = scoped {
            std::panic::resume_unwind(panic);
        }
        drop(result_tx);
        for (index, outcome) in result_rx.iter() {
            outcomes[index] = Some(outcome);
        }
    }

    packages
        .iter()
        .zip(outcomes)
        .filter_map(|(package, outcome)| {
            Some(PackageReport {
                path: package.path.clone(),
                outcome: outcome?,
            })
        })
        .collect()
}

fn worker_count(jobs: usize, packages: usize) -> usize {
    let wanted = if jobs == 0 { num_cpus::get() } else { jobs };
    wanted.min(packages).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_count_bounds() {
        assert_eq!(worker_count(4, 2), 2);
        assert_eq!(worker_count(3, 10), 3);
        assert_eq!(worker_count(8, 0), 1);
        assert!(worker_count(0, 64) >= 1);
    }
}
