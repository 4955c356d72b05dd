//! # codepraise
//!
//! Attributes lines of source code to the contributors who wrote them and
//! rolls the attribution up from files to folders and whole projects,
//! merging contributors who appear under several identities.
//!
//! ## Quick Start
//!
//! ```rust
//! use codepraise::contributions::{CreditShare, ContributorIdentity};
//!
//! let mut home = CreditShare::new();
//! home.add_credit(&ContributorIdentity::new("ann", "ann@home.io"), 3);
//! let mut work = CreditShare::new();
//! work.add_credit(&ContributorIdentity::new("ann", "ann@work.io"), 2);
//!
//! assert_eq!((home + work).total_credits(), 5);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod cache;
pub mod cli;
pub mod config;
pub mod contributions;
pub mod data;
pub mod git;
pub mod service;
pub mod store;

pub use crate::cli::Cli;

/// The current version of codepraise.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
