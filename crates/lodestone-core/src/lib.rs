//! # Lodestone Core
//!
//! Platform-independent library for hybrid article search.
//!
//! This crate provides the core algorithms used by the Lodestone search
//! tooling: heading-based document chunking, a semantic retrieval pipeline
//! backed by external embedding/vector/rerank services, client-side keyword
//! matching with excerpt highlighting, and deterministic merging of the two
//! result streams.
//!
//! ## Modules
//!
//! - [`chunking`] - Heading-based article chunking with greedy merging
//! - [`config`] - Production configuration constants
//! - [`content`] - Content store client for fetching raw article text
//! - [`embedding`] - Embedding service client abstractions
//! - [`error`] - Error types shared across the library
//! - [`indexing`] - Batch embedding and vector index upsert pipeline
//! - [`rerank`] - Cross-encoder reranking client and score application
//! - [`search`] - Retrieval pipeline, keyword matcher, highlighter, merger
//! - [`vector`] - Vector index client and language-partitioned index naming

pub mod chunking;
pub mod config;
pub mod content;
pub mod embedding;
pub mod error;
pub mod indexing;
pub mod rerank;
pub mod search;
pub mod vector;
