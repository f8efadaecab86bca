pub mod approvals;
pub mod chat;
pub mod memories;
pub mod phases;
pub mod projects;
