//! Parallel processing utilities.
//!
//! Items are split into contiguous, statically sized partitions; each rayon
//! task maps one partition sequentially. Output order always matches input
//! order.

use rayon::prelude::*;

/// Multiplier for number of partitions relative to CPU threads.
/// Using 3x threads provides good load balancing when some partitions finish faster.
const CHUNKS_PER_THREAD: usize = 3;

/// Compute partition size for the given length on the current rayon pool.
#[inline]
pub fn auto_chunk_size(len: usize) -> usize {
    let num_chunks = rayon::current_num_threads() * CHUNKS_PER_THREAD;
    (len / num_chunks).max(1)
}

/// Maps `f` over `items` in parallel using static partitioning.
///
/// Semantically equivalent to `items.iter().map(f).collect()`.
pub fn par_map_partitioned<T, R, F>(items: &[T], f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    let chunk_size = auto_chunk_size(items.len());
    let partitions: Vec<Vec<R>> = items
        .par_chunks(chunk_size)
        .map(|chunk| chunk.iter().map(&f).collect())
        .collect();

    let mut results = Vec::with_capacity(items.len());
    for partition in partitions {
        results.extend(partition);
    }
    results
}

/// Runs `op` on a dedicated pool with `workers` threads, or on the global
/// pool when `workers` is `None`.
pub fn with_workers<R, OP>(workers: Option<usize>, op: OP) -> Result<R, rayon::ThreadPoolBuildError>
where
    R: Send,
    OP: FnOnce() -> R + Send,
{
    match workers {
        Some(count) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(count)
                .thread_name(|idx| format!("cellmatch-worker-{idx}"))
                .build()?;
            Ok(pool.install(op))
        }
        None => Ok(op()),
    }
}
