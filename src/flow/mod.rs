//! Client-side data flow shared by the marketplace pages: a filter form
//! feeding a race-guarded listing fetcher feeding a map display. Pure
//! state logic; the map side talks to a pluggable backend.

pub mod fetch;
pub mod filter;
pub mod map;
