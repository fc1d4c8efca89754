//! Domain models and request/response types

pub mod assignment;
pub mod book;
pub mod borrower;
pub mod staff;
