// lib/src/storage_engine/mod.rs

pub mod inmemory_storage;
pub mod storage_engine;

pub use inmemory_storage::InMemoryStorage;
pub use storage_engine::{
    CommitOutcome, HospitalStorageEngine, Precondition, RecordKind, WriteBatch, WriteOp,
};
