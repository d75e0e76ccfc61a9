/// Progress update interval (tick every N detected records)
pub const PROGRESS_INTERVAL: u64 = 1000;

/// Worker threads spawned per available core when no explicit count is given
pub const THREADS_PER_CORE: usize = 2;

/// Read buffer for the decompressed dump stream
pub const READ_BUFFER_SIZE: usize = 256 * 1024;

/// Write buffer for each exported table
pub const WRITE_BUFFER_SIZE: usize = 128 * 1024;

/// Dump file name used when no input is given on the command line
pub const DEFAULT_INPUT: &str = "dblp.rdf.gz";

pub const PAPERS_FILE: &str = "dblp_papers.csv";
pub const AUTHORS_FILE: &str = "dblp_authors.csv";
pub const AUTHORSHIPS_FILE: &str = "dblp_papers_authors.csv";

/// Number of worker threads to use when the caller does not pick one.
pub fn default_threads() -> usize {
    (num_cpus::get() * THREADS_PER_CORE).max(1)
}
