pub mod flux;
pub mod gate;
pub mod monitor;
pub mod pods;
