//! Route modules for PDF Sign Server

pub mod health;
pub mod sign;
