//! Line attribution: languages, identities, credit shares, and the file and
//! folder rollups built from them.

pub mod credit_share;
pub mod file;
pub mod folder;
pub mod identity;
pub mod language;
pub mod line;
pub mod mapper;

pub use credit_share::CreditShare;
pub use file::FileContribution;
pub use folder::FolderContribution;
pub use identity::{group_by_identity, ContributorIdentity, IdentityResolver};
pub use language::{
    LanguageConfig, LanguageDescriptor, LanguageRegistry, LineKind, UNKNOWN_LANGUAGE,
};
pub use line::CodeLine;
pub use mapper::ContributionsMapper;
