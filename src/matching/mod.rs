pub mod address;
pub mod detector;
pub mod manager;
pub mod name;
pub mod postal;
pub mod similarity;
