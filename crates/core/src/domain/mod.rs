pub mod agent;
pub mod crm;
pub mod submission;
