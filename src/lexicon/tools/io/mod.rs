pub mod definitions;
pub mod dictionary;
