pub mod clients;
pub mod materials;
pub mod projects;
