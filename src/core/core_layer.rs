// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "ranks/mod.rs"]
pub mod ranks;
