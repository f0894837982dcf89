mod health_check;
mod properties;
mod subscribe;

pub use health_check::*;
pub use properties::*;
pub use subscribe::*;
