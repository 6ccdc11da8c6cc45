//! Infrastructure layer.

pub mod directory;
pub mod encryption;

pub use self::{
    directory::Directory,
    encryption::{Encryption, KeyRing},
};
#[cfg(feature = "memory")]
pub use self::directory::InMemory;
