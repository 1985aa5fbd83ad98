//! # Relation Linker
//!
//! Reconciles records of a paginated remote store by a shared business key
//! and writes a relation from every matched destination record back to its
//! source record.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌────────────┐   ┌───────────┐   ┌──────────┐
//! │ RecordStore │──▶│ Classifier │──▶│ Key index │──▶│  Linker  │
//! │ Notion/Mem  │   │ src / dst  │   │ key → id  │   │ 1 update │
//! └─────────────┘   └─────┬──────┘   └───────────┘   └────┬─────┘
//!                         └──────── destinations ─────────┘
//!                                                         ▼
//!                                                   ┌──────────┐
//!                                                   │  Report  │
//!                                                   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export NOTION_TOKEN=secret_...
//! rlink scan                    # counts only, no writes
//! rlink link --dry-run          # resolve keys, no writes
//! rlink link                    # write relations
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Records, field values, outcomes |
//! | [`traits`] | The [`RecordStore`](traits::RecordStore) seam |
//! | [`connector_notion`] | Notion REST store |
//! | [`store_memory`] | In-memory store |
//! | [`retrieve`] | Paginated full retrieval |
//! | [`extract`] | Key extraction |
//! | [`classify`] | Source/destination split |
//! | [`index`] | Key index with duplicate detection |
//! | [`linker`] | Per-record linking |
//! | [`reconcile`] | Pipeline orchestration |
//! | [`report`] | Text and JSON reports |
//! | [`progress`] | Progress events |
//! | [`error`] | Run-level errors |

pub mod classify;
pub mod config;
pub mod connector_notion;
pub mod error;
pub mod extract;
pub mod index;
pub mod linker;
pub mod models;
pub mod progress;
pub mod reconcile;
pub mod report;
pub mod retrieve;
pub mod store_memory;
pub mod traits;
