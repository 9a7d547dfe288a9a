/// Errors from creating handles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandleError {
    #[error("cannot create {handle} before its parent {parent} exists")]
    MissingParent {
        handle: &'static str,
        parent: &'static str,
    },
}
