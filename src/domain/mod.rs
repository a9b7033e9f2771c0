mod appointment;
mod doctor;
mod money;
mod report;

pub use appointment::*;
pub use doctor::*;
pub use money::*;
pub use report::*;
