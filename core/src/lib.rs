//! Policy generation and confined launch for the `seatbox` tool.
//!
//! This crate assembles the writable-path allowlist, compiles it into a
//! Seatbelt (SBPL) profile, and launches a child command under
//! `sandbox-exec` with that profile. Enforcement itself is entirely the
//! OS's job; everything here is deterministic string and file work, so
//! it is unit testable on any platform.

mod absolute_path;
mod config;
mod folders;
mod seatbelt;

pub use absolute_path::normalize_path;
pub use absolute_path::normalize_path_against_base;
pub use config::SeatboxHome;
pub use config::find_seatbox_home;
pub use folders::AddOutcome;
pub use folders::add_folder;
pub use folders::load_folders;
pub use seatbelt::DEFAULT_COMMAND;
pub use seatbelt::MACOS_PATH_TO_SEATBELT_EXECUTABLE;
pub use seatbelt::compile_profile;
pub use seatbelt::create_seatbelt_command_args;
pub use seatbelt::exit_code_from_status;
pub use seatbelt::run_command_under_seatbelt;
