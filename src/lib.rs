//! Core library for the horaire command line application.
//!
//! The library turns weekly schedule spreadsheets into calendar events.
//! Spreadsheet, iCalendar, JSON and calendar-store adapters live under
//! [`horaire::io`], the table and interval types inside [`horaire::model`],
//! the cell parser in [`horaire::normalize`], [`horaire::time`] and
//! [`horaire::parse`], event building in [`horaire::materialize`], and the
//! workspace orchestration under [`horaire::sync`].

pub mod horaire;

pub use horaire::{
    HoraireError, Result, config, error, io, materialize, model, normalize, parse, sync, time,
};
