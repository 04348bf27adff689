pub mod branch;
pub mod branch_collection;
pub mod commit;
pub mod diff;
pub mod repository;
pub mod tag;
pub mod version;

// Re-export commonly used types
pub use branch::{Branch, BranchError};
pub use branch_collection::BranchCollection;
pub use commit::{Commit, CommitError};
pub use diff::{Diff, DiffStat, parse_numstat};
pub use repository::{
    BranchOptions, CheckoutOptions, CleanOptions, FetchOptions, LogOptions, Repository,
    RepositoryOptions, SubmoduleOptions,
};
pub use tag::{Tag, TagError};
pub use version::GitVersion;
