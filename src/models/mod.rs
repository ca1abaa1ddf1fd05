pub mod credential;
pub mod submission;

pub use credential::StoredCredential;
pub use submission::{StoredFile, StoredRecord, Submission};
