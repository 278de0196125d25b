pub mod ingest;
pub mod object_store;
pub mod password;
pub mod reconcile;
pub mod s3;
pub mod signer;
pub mod staging;
