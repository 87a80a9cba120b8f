pub mod cointracking;
pub mod export;
pub mod trades;

pub use cointracking::*;
pub use export::*;
pub use trades::*;
