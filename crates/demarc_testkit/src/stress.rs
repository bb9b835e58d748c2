//! Stress helpers for the attribute resolver.
//!
//! These drive many threads into the resolver at the same moment to check
//! the once-per-key computation guarantee under contention.

use demarc_core::{AttributeResolver, OperationKey, TransactionAttribute, TxResult};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

/// What each thread observed for each key, in key order.
pub type ThreadResults = Vec<TxResult<Option<Arc<TransactionAttribute>>>>;

/// Outcome of [`concurrent_resolve`].
#[derive(Debug)]
pub struct ConcurrentResolveOutcome {
    /// Results per thread.
    pub per_thread: Vec<ThreadResults>,
    /// Wall time from the shared start to the last thread finishing.
    pub duration: Duration,
}

impl ConcurrentResolveOutcome {
    /// Returns the number of failed resolutions.
    pub fn failures(&self) -> usize {
        self.per_thread
            .iter()
            .flatten()
            .filter(|result| result.is_err())
            .count()
    }

    /// Returns true if every thread saw the same result for each key.
    ///
    /// Transactional results must be the very same shared attribute, not
    /// just equal values.
    pub fn consistent(&self) -> bool {
        let Some((first, rest)) = self.per_thread.split_first() else {
            return true;
        };
        rest.iter().all(|other| {
            first.iter().zip(other).all(|(a, b)| match (a, b) {
                (Ok(Some(a)), Ok(Some(b))) => Arc::ptr_eq(a, b),
                (Ok(None), Ok(None)) => true,
                (Err(a), Err(b)) => a == b,
                _ => false,
            })
        })
    }

    /// Prints a summary of the run.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Threads: {}", self.per_thread.len());
        println!("Failures: {}", self.failures());
        println!("Consistent: {}", self.consistent());
        println!("Duration: {:?}", self.duration);
    }
}

/// Resolves every key from `threads` threads released at the same moment.
///
/// Thread `i` walks the keys starting at offset `i` so that first calls for
/// different keys overlap.
pub fn concurrent_resolve(
    resolver: &Arc<AttributeResolver>,
    keys: &[OperationKey],
    threads: usize,
) -> ConcurrentResolveOutcome {
    let barrier = Arc::new(Barrier::new(threads));
    let start = Instant::now();

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let resolver = Arc::clone(resolver);
            let barrier = Arc::clone(&barrier);
            let keys = keys.to_vec();
            thread::spawn(move || {
                barrier.wait();
                let mut results: Vec<Option<_>> = (0..keys.len()).map(|_| None).collect();
                for step in 0..keys.len() {
                    let index = (t + step) % keys.len();
                    let key = keys[index];
                    results[index] = Some(resolver.resolve(key.operation, key.implementing_type));
                }
                results.into_iter().flatten().collect::<ThreadResults>()
            })
        })
        .collect();

    let per_thread = handles
        .into_iter()
        .map(|h| h.join().expect("Resolver thread panicked"))
        .collect();

    ConcurrentResolveOutcome {
        per_thread,
        duration: start.elapsed(),
    }
}
