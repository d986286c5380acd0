pub mod enums;
pub mod parameter;
pub mod patient;

pub use enums::*;
pub use parameter::{Parameter, ReferenceRange};
pub use patient::{Lifestyle, PatientContext};
