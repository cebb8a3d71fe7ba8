pub mod cloud_item;

pub use cloud_item::*;
