#![doc = include_str!("../README.md")]
#![no_std]
#![deny(clippy::mod_module_files)]

extern crate alloc;

pub mod config;
pub mod errors;
pub mod generator;
pub mod schema;
pub mod sql;

pub use config::{Config, UserSource};
pub use errors::Error;
pub use generator::{
    HistoryScript, HistoryTable, PointInTimeQueries, TriggerEvent, Triggers, generate_history_sql,
    generate_history_table, generate_point_in_time_queries, generate_triggers,
};
pub use schema::{Column, ColumnConstraint, ConstraintKind, ForeignKey, ReferentialAction, Table};
pub use sql::{ParseError, parse_create_table, parse_create_tables};
