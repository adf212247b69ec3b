//! Terminal front end for each command

pub mod account;
pub mod portfolio;
pub mod quote;
pub mod setup;
pub mod trade;
pub mod ui;
