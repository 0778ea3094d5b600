//! Marker types describing what a [`DateTimeOf`] stands for.
//!
//! [`DateTimeOf`]: crate::DateTimeOf

/// Entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Entity modification.
#[derive(Clone, Copy, Debug)]
pub struct Modification;

/// Entity expiration.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;

/// Entity reception (e.g. goods delivered to a stock).
#[derive(Clone, Copy, Debug)]
pub struct Reception;

/// Entity usage.
#[derive(Clone, Copy, Debug)]
pub struct Usage;
