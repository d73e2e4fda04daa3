//! CLI command handlers.
//!
//! One handler per subcommand, wiring environment configuration into the
//! shared clients and rendering terminal output.

mod carry;
mod debtor;
mod fija;
mod inflation;
mod serve;
mod variables;
mod warm_cache;

pub use carry::run_carry;
pub use debtor::run_debtor;
pub use fija::run_fija;
pub use inflation::run_inflation;
pub use serve::run_serve;
pub use variables::run_variables;
pub use warm_cache::run_warm_cache;
