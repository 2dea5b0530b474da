//! Workspace automation, invoked as `cargo xtask <task>`.
//!
//! Output goes to the terminal of whoever runs the task, so plain
//! `println!` is used instead of tracing.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::env;
use std::process::{Command, ExitCode};

use anyhow::{bail, Context, Result};

mod packages;

/// Set to turn Clippy warnings into errors.
const CLIPPY_STRICT_VAR: &str = "XTASK_CLIPPY_STRICT";

/// Integration suites that drive the session resolver and provisioner
/// against in-memory fakes.
const RESOLVER_SUITES: &[&str] = &["resolver_integration", "provisioner_integration"];

/// Integration suites for the infra adapters. These start `wiremock`
/// servers or write `tempfile` fixtures.
const ADAPTER_SUITES: &[&str] = &[
    "hosted_auth_integration",
    "rest_profile_repository_integration",
    "auth_context_integration",
    "config_loader_integration",
];

struct Task {
    name: &'static str,
    about: &'static str,
    run: fn() -> Result<()>,
}

const TASKS: &[Task] = &[
    Task { name: "ci", about: "fmt, clippy, packages, then the full test run", run: ci },
    Task { name: "fmt", about: "Check formatting", run: fmt },
    Task { name: "clippy", about: "Lint every target", run: clippy },
    Task {
        name: "packages",
        about: "Compile each library crate on its own",
        run: packages::check_packages,
    },
    Task { name: "test", about: "Run every test in the workspace", run: test },
    Task { name: "resolver", about: "Run the resolver and provisioner suites", run: resolver },
    Task {
        name: "adapters",
        about: "Run the wiremock and tempfile backed infra suites",
        run: adapters,
    },
];

fn main() -> ExitCode {
    let Some(name) = env::args().nth(1).filter(|name| name != "help") else {
        usage();
        return ExitCode::SUCCESS;
    };

    let Some(task) = TASKS.iter().find(|task| task.name == name) else {
        eprintln!("no such task: {name}\n");
        usage();
        return ExitCode::FAILURE;
    };

    match (task.run)() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("xtask {name}: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn usage() {
    println!("usage: cargo xtask <task>\n");
    for task in TASKS {
        println!("    {:<10}{}", task.name, task.about);
    }
}

/// Run `cargo` with `args`, failing on a non-zero exit.
fn cargo(args: &[&str]) -> Result<()> {
    println!("$ cargo {}", args.join(" "));
    let status = Command::new("cargo")
        .args(args)
        .status()
        .with_context(|| format!("could not start cargo {}", args.join(" ")))?;

    if !status.success() {
        bail!("cargo {} exited with {status}", args.join(" "));
    }
    Ok(())
}

/// Run the named integration suites of `package`.
fn suites(package: &str, names: &[&str]) -> Result<()> {
    let mut args = vec!["test", "-p", package];
    for name in names {
        args.extend(["--test", *name]);
    }
    cargo(&args)
}

fn ci() -> Result<()> {
    fmt()?;
    clippy()?;
    packages::check_packages()?;
    test()?;
    println!("\nci passed");
    Ok(())
}

fn fmt() -> Result<()> {
    cargo(&["fmt", "--all", "--", "--check"]).context("run `cargo fmt --all` to fix")
}

fn clippy() -> Result<()> {
    let mut args = vec!["clippy", "--workspace", "--all-targets"];
    if env::var_os(CLIPPY_STRICT_VAR).is_some() {
        args.extend(["--", "-D", "warnings"]);
    }
    cargo(&args)
}

fn test() -> Result<()> {
    cargo(&["test", "--workspace"])
}

fn resolver() -> Result<()> {
    suites("magicbox-core", RESOLVER_SUITES)
}

fn adapters() -> Result<()> {
    suites("magicbox-infra", ADAPTER_SUITES)
}
