#![cfg_attr(all(doc, CHANNEL_NIGHTLY), feature(doc_auto_cfg))]
#![cfg_attr(doc_cfg, feature(doc_cfg))]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! A general-purpose emitter framework: traversal, context, memoization,
//! and reference-cycle resolution over a typed graph.
//!
//! This crate is a thin, stable-named facade over [`emitgraph_core`] —
//! depend on it directly unless you specifically need to pin against the
//! core crate's own version.

pub use emitgraph_core::*;
