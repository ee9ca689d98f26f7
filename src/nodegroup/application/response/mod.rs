pub mod async_job_response;
pub mod list_responses;
