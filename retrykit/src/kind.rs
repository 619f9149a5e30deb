//! Failure kinds used by allow-list policies.
//!
//! A [`FailureKind`] is a named node in a tree rooted at [`ANY`]. Failures
//! report their most specific kind through [`Classify`], and an allow-list
//! entry matches that kind or any of its ancestors.
//!
//! ```ignore
//! use retrykit::kind::{Classify, FailureKind, ANY};
//!
//! static STORAGE: FailureKind = FailureKind::new("storage", &ANY);
//! static DISK_FULL: FailureKind = FailureKind::new("storage.disk_full", &STORAGE);
//!
//! assert!(DISK_FULL.is_a("storage"));
//! assert!(DISK_FULL.is_a("any"));
//! assert!(!STORAGE.is_a("storage.disk_full"));
//! ```

use std::fmt;

/// Identifier of the root kind every failure belongs to.
pub const ANY_KIND: &str = "any";

/// Root of the kind tree.
pub static ANY: FailureKind = FailureKind::root(ANY_KIND);

/// A named failure kind with an optional parent.
#[derive(Debug, PartialEq, Eq)]
pub struct FailureKind {
    name: &'static str,
    parent: Option<&'static FailureKind>,
}

impl FailureKind {
    /// Create a kind without a parent.
    ///
    /// Allow-lists match a root kind by its own name or by `"any"`.
    pub const fn root(name: &'static str) -> Self {
        Self { name, parent: None }
    }

    /// Create a kind descending from `parent`.
    pub const fn new(name: &'static str, parent: &'static FailureKind) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    /// The identifier of this kind.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The parent kind, if any.
    pub fn parent(&self) -> Option<&'static FailureKind> {
        self.parent
    }

    /// Iterate over this kind followed by its ancestors.
    pub fn ancestry(&self) -> impl Iterator<Item = &FailureKind> {
        std::iter::successors(Some(self), |kind| kind.parent)
    }

    /// Check if this kind is `name` or descends from it.
    pub fn is_a(&self, name: &str) -> bool {
        self.ancestry().any(|kind| kind.name == name)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Failures that can report their kind.
pub trait Classify {
    /// The most specific kind of this failure.
    fn kind(&self) -> &'static FailureKind;
}

impl<T: Classify + ?Sized> Classify for Box<T> {
    fn kind(&self) -> &'static FailureKind {
        (**self).kind()
    }
}

/// Kinds for [`std::io::Error`].
pub mod io {
    use super::{FailureKind, ANY};

    /// Any I/O error.
    pub static IO: FailureKind = FailureKind::new("io", &ANY);
    /// [`std::io::ErrorKind::NotFound`].
    pub static NOT_FOUND: FailureKind = FailureKind::new("io.not_found", &IO);
    /// [`std::io::ErrorKind::PermissionDenied`].
    pub static PERMISSION_DENIED: FailureKind = FailureKind::new("io.permission_denied", &IO);
    /// Connection refused, reset or aborted.
    pub static CONNECTION: FailureKind = FailureKind::new("io.connection", &IO);
    /// [`std::io::ErrorKind::TimedOut`].
    pub static TIMED_OUT: FailureKind = FailureKind::new("io.timed_out", &IO);
    /// [`std::io::ErrorKind::Interrupted`].
    pub static INTERRUPTED: FailureKind = FailureKind::new("io.interrupted", &IO);
    /// [`std::io::ErrorKind::WouldBlock`].
    pub static WOULD_BLOCK: FailureKind = FailureKind::new("io.would_block", &IO);
}

impl Classify for std::io::Error {
    fn kind(&self) -> &'static FailureKind {
        use std::io::ErrorKind;

        match std::io::Error::kind(self) {
            ErrorKind::NotFound => &io::NOT_FOUND,
            ErrorKind::PermissionDenied => &io::PERMISSION_DENIED,
            ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected => &io::CONNECTION,
            ErrorKind::TimedOut => &io::TIMED_OUT,
            ErrorKind::Interrupted => &io::INTERRUPTED,
            ErrorKind::WouldBlock => &io::WOULD_BLOCK,
            _ => &io::IO,
        }
    }
}
