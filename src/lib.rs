//! linky - recursively link sibling packages declared in `package.json`.
//!
//! A package lists the packages it wants as working-tree copies under
//! `links`/`devLinks` (or as `link:`/`file:` dependencies). linky walks that
//! graph depth-first and drives the host package manager to register each
//! package globally and link it into its consumer, optionally installing
//! every linked package's own dependencies.

pub mod commands;
pub mod error;
pub mod host;
pub mod package;
pub mod runtime;

#[cfg(test)]
pub mod test_utils;
