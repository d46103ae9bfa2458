pub mod config;
pub mod dep;
pub mod doctor;
pub mod issue;
pub mod molecule;
pub mod recipe;
