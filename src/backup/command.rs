// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::DEFAULT_SHELL;

/// Build the argument vector for running `command` through `shell`.
///
/// The shell string is split on whitespace. An absent or blank shell falls back
/// to `/bin/sh -c`. The command is always passed as one final argument.
pub fn build_exec_command(shell: Option<&str>, command: &str) -> Vec<String> {
    let mut argv: Vec<String> = match shell.map(str::split_whitespace) {
        Some(parts) => parts.map(str::to_string).collect(),
        None => Vec::new(),
    };

    if argv.is_empty() {
        argv = DEFAULT_SHELL.iter().map(|s| s.to_string()).collect();
    }

    argv.push(command.to_string());
    argv
}
