// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test harness for the site forms service.
//!
//! Provides an in-memory application with fake collaborators, payload and
//! client generators, and attack simulation bookkeeping.

#![allow(dead_code)]

pub mod attacks;
pub mod fixtures;
pub mod generators;
pub mod metrics;
