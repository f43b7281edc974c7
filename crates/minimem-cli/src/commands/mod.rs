//! Command implementations.

pub mod check;
pub mod decisions;
pub mod health;
pub mod init;
pub mod seed;

pub use self::check::execute_check;
pub use self::decisions::execute_decisions;
pub use self::health::execute_health;
pub use self::init::execute_init;
pub use self::seed::execute_seed;
