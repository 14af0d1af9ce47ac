pub mod connectivity;
pub mod drafts;
pub mod events;
pub mod pending;
pub mod vehicles;
