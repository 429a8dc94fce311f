//! Zermelo records (`Raw*`) and the shapes served to kiosks.

pub mod appointment;
pub mod school;
pub mod subjects;
pub mod user;

pub use self::appointment::*;
pub use self::school::*;
pub use self::user::*;
