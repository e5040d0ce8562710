pub mod reader;
pub mod reconstruct;
pub mod structs;
