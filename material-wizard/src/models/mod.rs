pub mod draft;
pub mod requests;
pub mod responses;
