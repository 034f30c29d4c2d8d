mod client;
mod material;
mod project;

pub use client::{
    Address, Client, ClientChanges, ClientPage, ClientWithContacts, ContactPerson, NewClient,
    NewContact,
};
pub use material::{Material, MaterialChanges, MaterialPage, MaterialUnit, NewMaterial};
pub use project::{
    Budget, ClientContact, Location, Milestone, NewProject, Pagination, Project, ProjectChanges,
    ProjectModule, ProjectPage, ProjectStats, ProjectStatus, ProjectSummary, Timeline,
};
