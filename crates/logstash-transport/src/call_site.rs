// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Call-site attribution for shipped records.
//!
//! The default [`BacktraceResolver`] walks the stack of the thread that is
//! handling the record and keeps frames that are either native or that do not
//! belong to the Rust runtime. The *last* kept frame, i.e. the outermost one,
//! becomes the record's origin. For a typical binary that is the application
//! entry point rather than the nearest caller.
//!
//! Native frames carry a Rust symbol but no source location, which is what a
//! release build without debug info produces for application code.
//!
//! Runtime frames are:
//! - frames compiled from the toolchain's library sources (`std`, `core`,
//!   `alloc`, `test`, ...), which backtraces report under `/rustc/<hash>/` or
//!   under the `rust-src` component path, or whose symbol lives in one of
//!   those crates when no source location is known;
//! - foreign symbols without a Rust path, such as `_start`,
//!   `__libc_start_main`, `clone3` or the C `main` shim;
//! - frames for which no symbol could be resolved at all.

use std::fmt;

/// One stack frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallSite {
    pub path: Option<String>,
    pub function: Option<String>,
    pub method: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

impl CallSite {
    /// Application code without a source location.
    #[must_use]
    pub fn is_native(&self) -> bool {
        match (&self.path, &self.function) {
            (None, Some(function)) => is_rust_symbol(function) && !is_runtime_symbol(function),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_runtime(&self) -> bool {
        match (&self.path, &self.function) {
            (_, Some(function)) if !is_rust_symbol(function) => true,
            (Some(path), _) => is_runtime_path(path),
            (None, Some(function)) => is_runtime_symbol(function),
            (None, None) => true,
        }
    }

    fn from_symbol(symbol: &backtrace::Symbol) -> Self {
        let function = symbol.name().map(|name| format!("{name:#}"));
        let method = function.as_deref().and_then(method_name).map(str::to_owned);
        Self {
            path: symbol.filename().map(|path| path.display().to_string()),
            function,
            method,
            line: symbol.lineno(),
            column: symbol.colno(),
        }
    }
}

/// Produces the current call stack, innermost frame first.
pub trait CallSiteResolver: Send + Sync + fmt::Debug {
    fn resolve(&self) -> Vec<CallSite>;

    /// The frame a record is attributed to: the last element of [`Self::resolve`].
    fn origin(&self) -> Option<CallSite> {
        self.resolve().pop()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BacktraceResolver;

impl CallSiteResolver for BacktraceResolver {
    fn resolve(&self) -> Vec<CallSite> {
        let mut sites = Vec::new();
        backtrace::trace(|frame| {
            let mut resolved = false;
            backtrace::resolve_frame(frame, |symbol| {
                resolved = true;
                sites.push(CallSite::from_symbol(symbol));
            });
            if !resolved {
                sites.push(CallSite::default());
            }
            true
        });
        sites.retain(|site| site.is_native() || !site.is_runtime());
        sites
    }
}

/// Never attributes records; every envelope gets `file: {}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopResolver;

impl CallSiteResolver for NoopResolver {
    fn resolve(&self) -> Vec<CallSite> {
        Vec::new()
    }
}

/// Returns a fixed stack on every call.
#[derive(Debug, Clone, Default)]
pub struct FixedResolver {
    sites: Vec<CallSite>,
}

impl FixedResolver {
    #[must_use]
    pub fn new(sites: Vec<CallSite>) -> Self {
        Self { sites }
    }
}

impl CallSiteResolver for FixedResolver {
    fn resolve(&self) -> Vec<CallSite> {
        self.sites.clone()
    }
}

#[must_use]
pub fn is_runtime_path(path: &str) -> bool {
    let path = path.replace('\\', "/");
    path.starts_with("/rustc/") || path.contains("/lib/rustlib/src/rust/library/")
}

const RUNTIME_CRATES: &[&str] = &[
    "std",
    "core",
    "alloc",
    "test",
    "proc_macro",
    "panic_unwind",
    "panic_abort",
];

fn is_rust_symbol(function: &str) -> bool {
    function.contains("::")
}

/// Symbol defined in one of the toolchain's library crates.
#[must_use]
pub fn is_runtime_symbol(function: &str) -> bool {
    let root = function
        .trim_start_matches('<')
        .split("::")
        .next()
        .unwrap_or_default();
    RUNTIME_CRATES.contains(&root)
}

/// Method name of a demangled function path.
///
/// `app::Server::run` and `<app::Server as Drop>::drop` are methods,
/// `app::run` and `app::main::{{closure}}` are not.
#[must_use]
pub fn method_name(function: &str) -> Option<&str> {
    let segments = path_segments(function);
    let [.., owner, last] = segments.as_slice() else {
        return None;
    };
    let is_type = owner.starts_with('<') || owner.starts_with(|c: char| c.is_ascii_uppercase());
    let is_ident = last.starts_with(|c: char| c.is_alphabetic() || c == '_');
    (is_type && is_ident).then_some(*last)
}

// Splits on `::` outside of angle brackets.
fn path_segments(path: &str) -> Vec<&str> {
    let bytes = path.as_bytes();
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'<' => depth += 1,
            b'>' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                segments.push(&path[start..i]);
                start = i + 2;
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    segments.push(&path[start..]);
    segments
}
