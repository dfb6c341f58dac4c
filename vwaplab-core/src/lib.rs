//! VWAPLab Core: bars, sessions, aggregation, session indicators, strategies.
//!
//! This crate is the pure part of the system:
//! - Domain types (bars, position sides, brackets, order intents, trades)
//! - Session keying in exchange-local time
//! - CSV ingest of 1-minute bars and fixed-width aggregation
//! - Session-anchored VWAP and per-session ATR
//! - Long/bracket and short/reversal decision state machines
//!
//! Execution, accounting and configuration live in `vwaplab-runner`.

pub mod components;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod session;
