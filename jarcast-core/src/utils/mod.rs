pub mod amount;
pub mod shutdown;
pub mod youtube;
