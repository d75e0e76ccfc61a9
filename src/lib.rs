//! Ponder: DBLP RDF dump extraction into relational tables
//!
//! This crate turns a DBLP RDF/XML dump into three tab-separated tables
//! (papers, authors, paper-author links) with dense numeric ids:
//!
//! 1. **Scanning** -- Stream the (optionally compressed) dump line by line and cut it into
//!    record buffers on the per-type start/end markers
//! 2. **Processing** -- Hand each buffer to a worker pool that parses it, assigns ids on
//!    first sight and commits papers, authors and authorships to shared state
//! 3. **Export** -- After the pool drains, write every id from 1 to the maximum in order
//!
//! # Architecture
//!
//! - **Sequential detection, parallel processing** -- One reader thread, N workers fed
//!   through a crossbeam channel, with a wait-group barrier before results are read
//! - **Exactly-once ids** -- Double-checked locking on an FxHashMap registry so two
//!   workers racing on a new key observe the same id
//! - **Sharded payload stores** -- DashMap keyed by numeric id, last write wins
//! - **Append-only relation log** -- Each record's pairs are collected locally and
//!   appended under one lock
//! - **Atomic operations** -- Lock-free counters for run statistics
//! - **All-or-nothing records** -- Parsing and validation finish before the first
//!   shared write
//!
//! # Key Modules
//!
//! - [`reader`] -- Dump line reader with gzip/bzip2 decompression
//! - [`boundary`] -- Record boundary detection state machine
//! - [`parser`] -- DBLP RDF record grammar behind the [`parser::RecordParser`] trait
//! - [`registry`] -- Key to dense numeric id assignment
//! - [`store`] -- Concurrent id to payload store
//! - [`relation`] -- Append-only (paper, author) log
//! - [`catalog`] -- The shared state of one run
//! - [`processor`] -- Per-record parse, validate and commit
//! - [`pool`] -- Fixed worker pool with quiescence barrier
//! - [`pipeline`] -- Wires reader, detector and pool into one run
//! - [`export`] -- TSV table writer
//! - [`models`] -- Core data types (RecordKind, Paper, Author)
//! - [`stats`] -- Thread-safe atomic counters for run metrics
//! - [`error`] -- Typed lookup, index and parse errors
//! - [`config`] -- Constants for extraction and export
//!
//! # Example Usage
//!
//! ```bash
//! # Full extraction with one worker per hardware thread
//! ponder extract -i dblp.rdf.gz -o output/ --threads 16
//!
//! # Count records per type without processing them
//! ponder scan -i dblp.rdf.gz --limit 100000
//! ```

pub mod boundary;
pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod pool;
pub mod processor;
pub mod reader;
pub mod registry;
pub mod relation;
pub mod stats;
pub mod store;
