pub mod submission_service;

pub use submission_service::{SubmissionGrpcService, SERVICE_NAME};

/// Include generated proto code.
pub mod proto {
    tonic::include_proto!("interview.v1");

    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("interview_descriptor");
}
