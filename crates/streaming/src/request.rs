use std::path::PathBuf;

use foundation::Year;
use scene::SelectionSnapshot;

/// Identifies a load in a deterministic, stable way.
///
/// Ids are handed out in issue order, so comparing them tells which of two
/// loads was requested later.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

/// A pending load of one year's feature file.
///
/// `stamp` is the selection the load was issued for. The binder uses it to
/// discard renders that would otherwise be driven by an out-of-date request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub id: RequestId,
    pub year: Year,
    pub path: PathBuf,
    pub stamp: SelectionSnapshot,
}
