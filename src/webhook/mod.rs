// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! HTTP endpoints: the TLS admission webhook and the metrics listener.

pub mod server;

pub use server::{serve_metrics, serve_webhook};
