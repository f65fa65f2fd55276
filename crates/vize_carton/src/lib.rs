//! Carton - The artist's toolbox for Vize.
//!
//! This crate provides the foundational utilities shared by the Vize script compiler,
//! much like a carton (artist's portfolio case) holds all the essential tools and materials
//! an artist needs for their work.
//!
//! # Modules
//!
//! - **general**: identifier and string helpers used during code generation
//! - **source_map**: line index, VLQ encoding and v3 source map output
//!
//! # Example
//!
//! ```
//! use vize_carton::{get_escaped_prop_name, is_simple_identifier};
//!
//! assert!(is_simple_identifier("msg"));
//! assert_eq!(get_escaped_prop_name("aria-label"), "\"aria-label\"");
//! ```

pub mod general;
pub mod source_map;

// Re-export smallvec for stack-optimized collections
pub use smallvec::{smallvec, SmallVec};

// Re-export rustc-hash for fast hash maps/sets
pub use rustc_hash::{FxHashMap, FxHashSet};

// Re-export phf for compile-time perfect hash functions
pub use phf::{phf_map, phf_set, Map as PhfMap, Set as PhfSet};

// Re-export shared utilities
pub use general::*;
pub use source_map::{LineIndex, SourceMap, SourceMapBuilder};
