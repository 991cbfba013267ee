//! CLI command implementations.
//!
//! | Module     | Commands handled |
//! |------------|------------------|
//! | `run`      | `Run`            |
//! | `config`   | `Config`         |
//! | `archived` | `Archived`       |

pub mod archived;
pub mod config;
pub mod run;

pub use archived::cmd_archived;
pub use config::cmd_config;
pub use run::cmd_run;
