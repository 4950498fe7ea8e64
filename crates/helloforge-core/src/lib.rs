//! Deterministic TLS ClientHello construction and JA3/JA4 fingerprinting.
//!
//! [`hello::builder`] turns a [`hello::ClientHelloSpec`] into wire bytes,
//! [`fingerprint::clienthello`] walks wire bytes back into the ordered fields
//! the fingerprints hash, and [`fingerprint::ja3`] / [`fingerprint::ja4`]
//! reduce those fields to canonical strings and digests.

pub mod echo;
pub mod fingerprint;
pub mod hello;
pub mod profile;
pub mod selftest;
pub mod template;
