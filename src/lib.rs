//! # Oracc Resolver
//!
//! Load Oracc project catalogues, text editions and glossaries by project
//! and key, caching what is downloaded.
//!
//! Callers ask for an artifact; the resolver decides whether the bytes come
//! from the local cache, from a cached project archive, or from a fresh
//! archive download, and records which one on the returned record.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐  ┌────────────────┐
//! │ Project        │  │ Archive index  │
//! │ directory      │  │ (hosted zips)  │
//! └───────┬────────┘  └───────┬────────┘
//!         └────────┬──────────┘
//!                  ▼
//!           ┌─────────────┐      ┌─────────────┐
//!           │   Binder    │      │ Cache store │
//!           │ path → URL  │      │  <root>/…   │
//!           └──────┬──────┘      └──────┬──────┘
//!                  │    ┌───────────┐   │
//!                  └───▶│ Resolver  │◀──┘
//!                       └─────┬─────┘
//!                             ▼
//!                       ┌───────────┐
//!                       │ Extractor │  zip member → bytes
//!                       └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! oracc projects --available
//! oracc catalogue saao/saa13
//! oracc text saao/saa13 P285574
//! oracc glossary saao/saa13 gloss-akk
//! oracc cache clear
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Projects, catalogues, texts, glossaries, provenance |
//! | [`error`] | Error taxonomy |
//! | [`transport`] | Blocking HTTP fetch |
//! | [`directory`] | Project directory client |
//! | [`archive_index`] | Archive listing client |
//! | [`binder`] | Project ↔ archive join |
//! | [`cache_store`] | On-disk cache |
//! | [`extractor`] | Zip member extraction |
//! | [`resolver`] | Cache-first resolution |
//! | [`direct`] | Live-site source for a single project |
//! | [`traits`] | The [`ArtifactSource`](traits::ArtifactSource) contract |

pub mod archive_index;
pub mod binder;
pub mod cache_store;
pub mod config;
pub mod direct;
pub mod directory;
pub mod error;
pub mod extractor;
pub mod models;
pub mod resolver;
pub mod traits;
pub mod transport;

pub use error::{ResolveError, Result};
pub use resolver::{DownloadOutcome, Resolver};
pub use traits::ArtifactSource;
