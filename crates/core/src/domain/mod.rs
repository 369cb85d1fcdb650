pub mod chat;
pub mod intent;
pub mod product;
