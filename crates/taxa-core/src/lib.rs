//! taxa-core: the tag hierarchy engine and catalog domain types
//!
//! Core defines the domain model and storage traits; backends implement
//! them (Dependency Inversion, so `taxa-sqlite` depends on this crate
//! and not the other way around). The engine proper is four pieces:
//!
//! - [`store::TagStore`] — CRUD over tag nodes keyed by slug
//! - [`validate::TreeIntegrityValidator`] — approves every mutation
//! - [`ancestry::AncestryResolver`] — bounded reachability walks
//! - [`bulk::BulkChildInserter`] — atomic batch child creation
//!
//! sequenced by the [`service::TagService`] façade under one mutation
//! lock. [`memory::MemoryTagStore`] is a deterministic in-process
//! backend used by tests and embedders.

pub mod ancestry;
pub mod bulk;
pub mod error;
pub mod memory;
pub mod problem;
pub mod service;
pub mod store;
pub mod tag;
pub mod validate;

pub use ancestry::AncestryResolver;
pub use bulk::{tokenize, BulkChildInserter};
pub use error::{TagError, TagResult};
pub use memory::MemoryTagStore;
pub use problem::{
    check_hardness, Problem, ProblemError, ProblemResult, ProblemStore, MOHS_MAX, MOHS_STEP,
};
pub use service::{FilterToggleReport, TagService};
pub use store::TagStore;
pub use tag::{display_name, normalize_name, validate_slug, Tag, TagPatch, MAX_DESCRIPTION_LEN};
pub use validate::TreeIntegrityValidator;
