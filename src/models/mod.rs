pub mod ledger;
pub mod settings;
pub mod trade;

pub use ledger::*;
pub use settings::*;
pub use trade::*;
