/// External record service access
///
/// This module contains everything that touches the hosted record service
/// directly: the wire protocol, the `RecordService` trait, and its
/// implementations.
///
/// - `protocol`: parameter and envelope shapes
/// - `service`: the async `RecordService` trait
/// - `http`: reqwest-backed implementation and its configuration
/// - `memory`: in-process implementation with fault injection

pub mod http;
pub mod memory;
pub mod protocol;
pub mod service;

// Re-export main types
pub use http::{HttpRecordService, UpstreamConfig, UpstreamConfigError};
pub use memory::{Fault, InMemoryRecordService, Operation, CREATED_ON_FIELD};
pub use protocol::{
    DeleteParams, DeleteResponse, FetchParams, FetchResponse, FieldSpec, GetParams, GetResponse,
    MutationResponse, MutationResult, OrderBy, PagingInfo, Record, RecordsParams, SortType,
    WhereClause, ID_FIELD, NAME_FIELD,
};
pub use service::RecordService;
