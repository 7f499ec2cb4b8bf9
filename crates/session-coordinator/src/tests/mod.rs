//! Deterministic virtual-time tests for the session coordinator.
//!
//! Everything runs under `start_paused` so twenty-minute scenarios cost
//! nothing; the harness injects synthetic pulses and records every
//! notification the coordinator emits.

mod harness;
