pub mod decoder;
pub mod reset;
pub mod scanner;

pub use reset::reset_trap;
pub use scanner::scan_for_traps;
