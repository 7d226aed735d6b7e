mod entity;
mod error;
mod http_mapping;
mod repository;
mod traits;
mod types;

pub use entity::{from_record, identity, Entity, Transform};
pub use error::{RepositoryError, Result, UNKNOWN_ENTITY};
pub use http_mapping::repository_error_to_status_code;
pub use repository::EntityRepository;
pub use traits::{Backend, Repository};
pub use types::{
    to_record, Direction, ListParams, ListRequest, Page, RawPage, Record, DEFAULT_LIMIT,
};
