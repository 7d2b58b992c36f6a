//! Permission matrices for `chmod` and permission bits read from objects.

use std::fmt;

use crate::error::{ClientError, Result};
use crate::resource::Resource;
use crate::rpc::Value;

/// Who a permission applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    User,
    Group,
    Other,
}

impl Subject {
    pub const ALL: [Subject; 3] = [Subject::User, Subject::Group, Subject::Other];

    fn index(self) -> usize {
        match self {
            Subject::User => 0,
            Subject::Group => 1,
            Subject::Other => 2,
        }
    }

    fn element_prefix(self) -> &'static str {
        match self {
            Subject::User => "OWNER",
            Subject::Group => "GROUP",
            Subject::Other => "OTHER",
        }
    }
}

/// What a permission grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Use,
    Manage,
    Admin,
}

impl Capability {
    pub const ALL: [Capability; 3] = [Capability::Use, Capability::Manage, Capability::Admin];

    fn index(self) -> usize {
        match self {
            Capability::Use => 0,
            Capability::Manage => 1,
            Capability::Admin => 2,
        }
    }

    fn element_suffix(self) -> &'static str {
        match self {
            Capability::Use => "U",
            Capability::Manage => "M",
            Capability::Admin => "A",
        }
    }

    fn octal_bit(self) -> u8 {
        match self {
            Capability::Use => 4,
            Capability::Manage => 2,
            Capability::Admin => 1,
        }
    }

    fn letter(self) -> char {
        match self {
            Capability::Use => 'u',
            Capability::Manage => 'm',
            Capability::Admin => 'a',
        }
    }
}

/// One cell of a permission change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TriState {
    Allow,
    Deny,
    #[default]
    NoChange,
}

impl TriState {
    pub fn wire(self) -> i32 {
        match self {
            TriState::Allow => 1,
            TriState::Deny => 0,
            TriState::NoChange => -1,
        }
    }
}

/// A 3x3 permission change, every cell initially [`TriState::NoChange`].
///
/// Rendered row-major: user, group, other, each as use, manage, admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PermissionMatrix {
    cells: [[TriState; 3]; 3],
}

impl PermissionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, subject: Subject, capability: Capability, value: TriState) -> Self {
        self.cells[subject.index()][capability.index()] = value;
        self
    }

    pub fn with_allow(self, subject: Subject, capability: Capability) -> Self {
        self.with(subject, capability, TriState::Allow)
    }

    pub fn with_deny(self, subject: Subject, capability: Capability) -> Self {
        self.with(subject, capability, TriState::Deny)
    }

    pub fn get(&self, subject: Subject, capability: Capability) -> TriState {
        self.cells[subject.index()][capability.index()]
    }

    /// Build a full matrix from an octal string such as `"640"`.
    ///
    /// Every cell is set to allow or deny; nothing is left unchanged.
    pub fn from_octal(octal: &str) -> Result<Self> {
        let digits: Vec<u8> = octal
            .trim()
            .chars()
            .map(|c| c.to_digit(8).map(|d| d as u8))
            .collect::<Option<_>>()
            .filter(|d: &Vec<u8>| d.len() == 3)
            .ok_or_else(|| ClientError::unknown("octal permission", octal))?;

        let mut matrix = Self::new();
        for (subject, digit) in Subject::ALL.into_iter().zip(digits) {
            for capability in Capability::ALL {
                let value = if digit & capability.octal_bit() != 0 {
                    TriState::Allow
                } else {
                    TriState::Deny
                };
                matrix = matrix.with(subject, capability, value);
            }
        }
        Ok(matrix)
    }

    /// The nine cells in wire order.
    pub fn render(&self) -> [i32; 9] {
        let mut out = [TriState::NoChange.wire(); 9];
        for subject in Subject::ALL {
            for capability in Capability::ALL {
                out[subject.index() * 3 + capability.index()] =
                    self.get(subject, capability).wire();
            }
        }
        out
    }

    /// Whether applying this matrix changes nothing.
    pub fn is_noop(&self) -> bool {
        self.cells.iter().flatten().all(|c| *c == TriState::NoChange)
    }

    pub(crate) fn to_args(self) -> Vec<Value> {
        self.render().into_iter().map(Value::Int).collect()
    }
}

/// Permission bits currently set on an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Permissions {
    bits: [[bool; 3]; 3],
}

impl Permissions {
    pub(crate) fn from_resource(resource: &Resource) -> Result<Self> {
        let mut bits = [[false; 3]; 3];
        for subject in Subject::ALL {
            for capability in Capability::ALL {
                let path = format!(
                    "PERMISSIONS/{}_{}",
                    subject.element_prefix(),
                    capability.element_suffix()
                );
                let bit: i32 = resource.parse_attribute(&path)?;
                bits[subject.index()][capability.index()] = match bit {
                    0 => false,
                    1 => true,
                    other => return Err(ClientError::unknown("permission bit", other)),
                };
            }
        }
        Ok(Self { bits })
    }

    pub fn allows(&self, subject: Subject, capability: Capability) -> bool {
        self.bits[subject.index()][capability.index()]
    }

    /// Octal form, e.g. `"640"`.
    pub fn to_octal(&self) -> String {
        Subject::ALL
            .into_iter()
            .map(|subject| {
                let digit: u8 = Capability::ALL
                    .into_iter()
                    .filter(|c| self.allows(subject, *c))
                    .map(Capability::octal_bit)
                    .sum();
                char::from(b'0' + digit)
            })
            .collect()
    }

    /// A matrix that sets exactly these bits.
    pub fn to_matrix(&self) -> PermissionMatrix {
        let mut matrix = PermissionMatrix::new();
        for subject in Subject::ALL {
            for capability in Capability::ALL {
                matrix = if self.allows(subject, capability) {
                    matrix.with_allow(subject, capability)
                } else {
                    matrix.with_deny(subject, capability)
                };
            }
        }
        matrix
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for subject in Subject::ALL {
            for capability in Capability::ALL {
                let c = if self.allows(subject, capability) {
                    capability.letter()
                } else {
                    '-'
                };
                write!(f, "{}", c)?;
            }
        }
        Ok(())
    }
}
