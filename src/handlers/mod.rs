pub mod accounts;
pub mod admin;
pub mod cms;
pub mod comments;
pub mod daily;
pub mod tasks;

/// Selector for the shared create-or-edit handlers. The route fixes the
/// variant, so a missing record id can never be mistaken for "make a new
/// one".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Create,
    Existing(i64),
}
