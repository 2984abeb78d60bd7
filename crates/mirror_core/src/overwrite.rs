//! Per-subject permission overwrite sets.

use crate::PermissionRecord;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Reference to the subject an overwrite applies to, keyed by source-side id.
///
/// Serialized as `role:<id>` or `member:<id>`. `user:<id>` is accepted as a
/// member alias on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum SubjectRef {
    /// A role subject
    #[display("role:{_0}")]
    Role(u64),
    /// A member subject; read from documents but never applied
    #[display("member:{_0}")]
    Member(u64),
}

impl SubjectRef {
    /// Source-side id of the subject.
    pub fn id(&self) -> u64 {
        match self {
            SubjectRef::Role(id) | SubjectRef::Member(id) => *id,
        }
    }

    /// True for role subjects.
    pub fn is_role(&self) -> bool {
        matches!(self, SubjectRef::Role(_))
    }
}

impl FromStr for SubjectRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, raw_id) = s
            .split_once(':')
            .ok_or_else(|| format!("subject key '{}' has no ':' separator", s))?;
        let id: u64 = raw_id
            .parse()
            .map_err(|_| format!("subject key '{}' has a non-numeric id", s))?;
        match kind {
            "role" => Ok(SubjectRef::Role(id)),
            "member" | "user" => Ok(SubjectRef::Member(id)),
            other => Err(format!("unknown subject type '{}'", other)),
        }
    }
}

impl Serialize for SubjectRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Mapping from subject to its sparse permission record.
///
/// Ordered by subject so encoding and comparison are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PermissionOverwriteSet(BTreeMap<SubjectRef, PermissionRecord>);

impl PermissionOverwriteSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for a subject.
    pub fn insert(&mut self, subject: SubjectRef, record: PermissionRecord) {
        self.0.insert(subject, record);
    }

    /// Builder-style [`PermissionOverwriteSet::insert`].
    pub fn with(mut self, subject: SubjectRef, record: PermissionRecord) -> Self {
        self.insert(subject, record);
        self
    }

    /// Record for a subject, if any.
    pub fn get(&self, subject: &SubjectRef) -> Option<&PermissionRecord> {
        self.0.get(subject)
    }

    /// Number of subjects.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no subject has an overwrite.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate all subjects in order.
    pub fn iter(&self) -> impl Iterator<Item = (&SubjectRef, &PermissionRecord)> {
        self.0.iter()
    }

    /// Iterate role subjects only.
    pub fn roles(&self) -> impl Iterator<Item = (u64, &PermissionRecord)> {
        self.0.iter().filter_map(|(subject, record)| match subject {
            SubjectRef::Role(id) => Some((*id, record)),
            SubjectRef::Member(_) => None,
        })
    }
}

impl FromIterator<(SubjectRef, PermissionRecord)> for PermissionOverwriteSet {
    fn from_iter<I: IntoIterator<Item = (SubjectRef, PermissionRecord)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for PermissionOverwriteSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<BTreeMap<String, PermissionRecord>>::deserialize(deserializer)?;
        let mut set = Self::new();
        for (key, record) in raw.unwrap_or_default() {
            match key.parse::<SubjectRef>() {
                Ok(subject) => set.insert(subject, record),
                Err(reason) => {
                    tracing::warn!(key = %key, %reason, "Skipping unparsable overwrite subject");
                }
            }
        }
        Ok(set)
    }
}
