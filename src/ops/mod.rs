//! Repository operations
//!
//! Each file implements one public operation as an `impl Repository` block:
//!
//! - `init`: create the metadata directory and the default branch
//! - `snapshot`: record the working directory as a commit on a branch
//! - `write_commit`: shared commit creation and branch pointer advance
//! - `merge`: three-way merge of one branch into another
//! - `checkout`: materialize a commit's tree into the working directory,
//!   plus `switch` for moving `HEAD` between branches
//! - `branch`: branch creation, deletion, listing, and `current_branch`
//! - `history`: ordered commit listings and lazy ancestor walks

mod branch;
mod checkout;
mod history;
mod init;
mod merge;
mod snapshot;
mod write_commit;

pub use init::DEFAULT_BRANCH;
