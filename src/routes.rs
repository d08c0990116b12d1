pub mod admin;
pub mod contact;
pub mod events;
pub mod feedback;
pub mod index;
pub mod join;
pub mod profile;
