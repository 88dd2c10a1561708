// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod admission;
pub mod backup;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod kubernetes;
pub mod metrics;
pub mod operator;
pub mod reconcilers;
pub mod scheduler;
pub mod webhook;

#[cfg(test)]
pub(crate) mod test_utils;
