//! Parallel processing
#![deny(missing_docs)]

mod par_proc;

pub use par_proc::{decipher_panic, process_with_pool, Proc, READ_AHEAD};
