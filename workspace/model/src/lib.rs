pub mod entities;
pub mod principal;

pub use principal::Principal;
