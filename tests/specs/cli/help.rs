//! Help and version output

use crate::prelude::*;

#[test]
fn gj_help_lists_subcommands() {
    gj().args(&["--help"])
        .passes()
        .stdout_has("submit")
        .stdout_has("list")
        .stdout_has("cancel")
        .stdout_has("gpus")
        .stdout_has("wait");
}

#[test]
fn gj_version() {
    gj().args(&["--version"]).passes().stdout_has("gj ");
}

#[test]
fn gjd_version() {
    gjd()
        .args(&["--version"])
        .passes()
        .stdout_eq(&format!("gjd {}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn gjd_help_mentions_environment() {
    gjd().args(&["--help"]).passes().stdout_has("GJ_*");
}

#[test]
fn gjd_rejects_unknown_arguments() {
    gjd().args(&["--frobnicate"]).fails();
}
