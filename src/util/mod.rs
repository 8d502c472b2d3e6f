//! Private utility types used internally within `capstub`.
//!
//! These are all bits of functionality that _could_ exist as their own crates /
//! libraries, and do not rely on any `capstub` specific infrastructure.

pub mod arena;
