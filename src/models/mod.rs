pub mod device;
pub mod enums;
pub mod profile;
pub mod vital;

pub use device::*;
pub use enums::*;
pub use profile::*;
pub use vital::*;
