// Discord commands module.
// Each feature gets its own command file.

pub mod ranks;

pub mod ranks_settings;
