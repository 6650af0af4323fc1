mod rupiah;

pub mod helpers;
pub mod op;
mod secret;

pub use rupiah::Rupiah;
pub use secret::Secret;
