// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! Generates topology configurations across the accepted input space and
//! checks the graph and template invariants on each of them.

mod graph_properties;
