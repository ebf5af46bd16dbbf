//! Pure domain logic of the spot service - geospatial filtering of spots and
//! reconciliation of like/dislike reactions. No I/O, no shared state; callers
//! (handlers, repositories) feed in current state and persist the results.

pub mod geo;
pub mod interaction;
