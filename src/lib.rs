//! # DevKB
//!
//! A developer knowledge base: short notes, decisions, and docs stored as
//! typed, tagged entries and found again by substring search.
//!
//! DevKB ships two independent surfaces that do not share state:
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐        ┌───────────────┐
//! │  HTTP (API)  │──▶│ InMemoryStore │        │  CLI (devkb)  │
//! │ axum server  │   │  (devkb-core) │        │ index/add/ask │
//! └──────────────┘   └───────────────┘        └──────┬────────┘
//!                                                   ▼
//!                                     <dataDir>/index/files.json
//!                                     <dataDir>/knowledge/<id>.json
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! devkb init                          # write .devkb.json, create .devkb/
//! devkb index                         # build the file-name index
//! devkb search auth                   # match indexed file names
//! devkb add decision --title "Use JWT" --content "stateless auth" --tags auth
//! devkb ask jwt                       # templated answer over CLI entries
//! devkb serve                         # start the REST API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | `.devkb.json` loading and `devkb init` |
//! | [`server`] | REST API with the uniform response envelope |
//! | [`indexer`] | File walk, `files.json`, file-name search |
//! | [`knowledge`] | CLI flat-file entries: add, list, ask |
//! | [`stats`] | `devkb stats` summary |

pub mod config;
pub mod indexer;
pub mod knowledge;
pub mod server;
pub mod stats;
