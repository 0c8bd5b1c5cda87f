pub mod enums;
pub mod patient;
pub mod photo;
pub mod procedure;
pub mod sections;
pub mod user;

pub use enums::*;
pub use patient::*;
pub use photo::*;
pub use procedure::*;
pub use sections::*;
pub use user::*;
