//! Service boundary: requests in, typed results out.

pub mod appraise;
pub mod result;

pub use appraise::{AppraisalRequest, AppraiseProject};
pub use result::{ApiResult, ContributorCredit, Message, ProjectFolderContributions, Status};
