//! Snowflake-style unique identifiers.
//!
//! Every id is a single `u64` packing, from the most significant bit down:
//!
//! ```text
//!  Bit Index:  63           63 62            22 21               17 16           12 11             0
//!              +--------------+----------------+-------------------+---------------+---------------+
//!  Field:      | reserved (1) | timestamp (41) | datacenter ID (5) | worker ID (5) | sequence (12) |
//!              +--------------+----------------+-------------------+---------------+---------------+
//! ```
//!
//! The timestamp is measured in milliseconds from a deployment-wide epoch. A
//! generator only needs its local clock and the `(datacenter, worker)` pair it
//! was assigned; ids from one generator are strictly increasing, ids across
//! generators are roughly time-ordered.
//!
//! ```
//! use idworker::{IdGenerator, IdWorker, TWITTER_EPOCH};
//!
//! let worker = IdWorker::try_new(TWITTER_EPOCH, 1, 1)?;
//! let a = worker.next_id()?;
//! let b = worker.next_id()?;
//! assert!(a < b);
//! assert_eq!(a.worker_id(), 1);
//! assert_eq!(a.datacenter_id(), 1);
//! # Ok::<(), idworker::Error>(())
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

mod config;
mod error;
#[cfg(feature = "futures")]
mod futures;
mod generator;
mod id;
mod time;

pub use crate::config::*;
pub use crate::error::*;
#[cfg(feature = "futures")]
pub use crate::futures::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::time::*;
