// lib/src/lib.rs

pub mod access;
pub mod commands;
pub mod config;
pub mod database;
pub mod notifications;
pub mod reports;
pub mod services;
pub mod storage_engine;

// Re-export the domain types so downstream crates can use 'lib::*'.
pub use models::{HospitalError, HospitalResult, ValidationError};

pub use crate::access::AuthContext;
pub use crate::commands::*;
pub use crate::database::Database;
pub use crate::notifications::{LogMailer, MailSender};
pub use crate::reports::{DocumentRenderer, PlainTextRenderer};
pub use crate::storage_engine::{
    CommitOutcome, HospitalStorageEngine, InMemoryStorage, Precondition, RecordKind, WriteBatch,
    WriteOp,
};
