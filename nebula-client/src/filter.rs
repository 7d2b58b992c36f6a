//! Pool query arguments: ownership scope, VM state and pagination.

use crate::error::{ClientError, Result};
use crate::rpc::Value;

/// Which objects of a pool the caller wants, by ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnershipFilter {
    /// Objects belonging to the caller's primary group.
    PrimaryGroup,
    /// Objects owned by the caller.
    User,
    /// Every object the caller may see.
    All,
    /// Objects owned by the caller or any of their groups.
    UserAndGroups,
}

impl OwnershipFilter {
    pub fn wire(self) -> i32 {
        match self {
            OwnershipFilter::PrimaryGroup => -4,
            OwnershipFilter::User => -3,
            OwnershipFilter::All => -2,
            OwnershipFilter::UserAndGroups => -1,
        }
    }
}

impl TryFrom<i32> for OwnershipFilter {
    type Error = ClientError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            -4 => Ok(OwnershipFilter::PrimaryGroup),
            -3 => Ok(OwnershipFilter::User),
            -2 => Ok(OwnershipFilter::All),
            -1 => Ok(OwnershipFilter::UserAndGroups),
            other => Err(ClientError::unknown("ownership filter", other)),
        }
    }
}

/// First argument of a pool query: a scope, or one specific owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolFilter {
    Scope(OwnershipFilter),
    Owner(i32),
}

impl PoolFilter {
    /// Objects owned by user `uid`.
    ///
    /// Negative values are reserved for scopes and rejected.
    pub fn owner(uid: i32) -> Result<Self> {
        if uid < 0 {
            return Err(ClientError::Precondition(format!(
                "user id {} is negative and would be read as an ownership scope",
                uid
            )));
        }
        Ok(PoolFilter::Owner(uid))
    }

    pub fn wire(self) -> i32 {
        match self {
            PoolFilter::Scope(scope) => scope.wire(),
            PoolFilter::Owner(uid) => uid,
        }
    }
}

impl From<OwnershipFilter> for PoolFilter {
    fn from(scope: OwnershipFilter) -> Self {
        PoolFilter::Scope(scope)
    }
}

/// VM state restriction for VM pool queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VmStateFilter {
    AnyStateIncludingDone,
    #[default]
    AnyState,
    Init,
    Pending,
    Hold,
    Active,
    Stopped,
    Suspended,
    Done,
    Poweroff,
    Undeployed,
    Cloning,
    CloningFailure,
}

impl VmStateFilter {
    pub fn wire(self) -> i32 {
        match self {
            VmStateFilter::AnyStateIncludingDone => -2,
            VmStateFilter::AnyState => -1,
            VmStateFilter::Init => 0,
            VmStateFilter::Pending => 1,
            VmStateFilter::Hold => 2,
            VmStateFilter::Active => 3,
            VmStateFilter::Stopped => 4,
            VmStateFilter::Suspended => 5,
            VmStateFilter::Done => 6,
            VmStateFilter::Poweroff => 8,
            VmStateFilter::Undeployed => 9,
            VmStateFilter::Cloning => 10,
            VmStateFilter::CloningFailure => 11,
        }
    }
}

/// Pagination window of a pool query.
///
/// The server takes a start offset and a negated page size. Values are
/// forwarded as given; zero or negative windows are for the server to judge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Page {
    /// No pagination.
    #[default]
    All,
    /// Page `offset` (1-based) of `size` entries.
    Window { offset: i32, size: i32 },
}

impl Page {
    /// Offset meaning "no pagination".
    pub const OFFSET_DEFAULT: i32 = -1;
    /// Size meaning "no pagination".
    pub const SIZE_DEFAULT: i32 = -1;

    /// Build a page from raw values; both defaults mean [`Page::All`].
    pub fn new(offset: i32, size: i32) -> Self {
        if offset == Self::OFFSET_DEFAULT && size == Self::SIZE_DEFAULT {
            Page::All
        } else {
            Page::Window { offset, size }
        }
    }

    /// `(start, end)` as sent on the wire.
    pub fn wire(self) -> (i32, i32) {
        match self {
            Page::All => (-1, -1),
            Page::Window { offset, size } => {
                (offset.wrapping_sub(1).wrapping_mul(size), size.wrapping_neg())
            }
        }
    }
}

/// `[filter, start, end]` for a pool info call.
pub(crate) fn pool_args(filter: PoolFilter, page: Page) -> Vec<Value> {
    let (start, end) = page.wire();
    vec![
        Value::Int(filter.wire()),
        Value::Int(start),
        Value::Int(end),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ownership_wire_values() {
        assert_eq!(OwnershipFilter::PrimaryGroup.wire(), -4);
        assert_eq!(OwnershipFilter::User.wire(), -3);
        assert_eq!(OwnershipFilter::All.wire(), -2);
        assert_eq!(OwnershipFilter::UserAndGroups.wire(), -1);
        assert_eq!(OwnershipFilter::try_from(-2).unwrap(), OwnershipFilter::All);
        assert!(OwnershipFilter::try_from(0).is_err());
    }

    #[test]
    fn test_owner_filter_rejects_negative() {
        assert_eq!(PoolFilter::owner(0).unwrap().wire(), 0);
        assert_eq!(PoolFilter::owner(42).unwrap().wire(), 42);
        assert!(matches!(PoolFilter::owner(-1), Err(ClientError::Precondition(_))));
    }

    #[test]
    fn test_vm_state_wire_values() {
        assert_eq!(VmStateFilter::default().wire(), -1);
        assert_eq!(VmStateFilter::AnyStateIncludingDone.wire(), -2);
        assert_eq!(VmStateFilter::Done.wire(), 6);
        assert_eq!(VmStateFilter::Poweroff.wire(), 8);
        assert_eq!(VmStateFilter::CloningFailure.wire(), 11);
    }

    #[test]
    fn test_page_wire() {
        assert_eq!(Page::All.wire(), (-1, -1));
        assert_eq!(Page::new(-1, -1), Page::All);
        assert_eq!(Page::new(1, 10).wire(), (0, -10));
        assert_eq!(Page::new(3, 25).wire(), (50, -25));
    }

    #[test]
    fn test_page_does_not_validate() {
        assert_eq!(Page::new(0, 10).wire(), (-10, -10));
        assert_eq!(Page::new(2, 0).wire(), (0, 0));
        assert_eq!(Page::new(-1, 5).wire(), (-10, -5));
        // overflow wraps instead of panicking
        let _ = Page::new(i32::MIN, i32::MAX).wire();
    }

    #[test]
    fn test_pool_args() {
        let args = pool_args(OwnershipFilter::All.into(), Page::new(2, 5));
        assert_eq!(args, vec![Value::Int(-2), Value::Int(5), Value::Int(-5)]);
    }
}
