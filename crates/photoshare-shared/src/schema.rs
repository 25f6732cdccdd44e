//! Declarative record schema and authorization matrix.
//!
//! Each record kind is described by a [`RecordSchema`]: its fields with a
//! semantic type and required marker, and an ordered list of
//! (principal-class, allowed-operations) rules.  The tables are pure data;
//! whichever backend persists the records evaluates them on every request
//! through [`RecordSchema::authorize`].

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::types::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    Photo,
    Comment,
}

impl RecordKind {
    pub const fn name(self) -> &'static str {
        match self {
            RecordKind::Photo => "Photo",
            RecordKind::Comment => "Comment",
        }
    }

    pub fn schema(self) -> &'static RecordSchema {
        match self {
            RecordKind::Photo => &PHOTO_SCHEMA,
            RecordKind::Comment => &COMMENT_SCHEMA,
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Semantic type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Opaque unique identifier.
    Identifier,
    /// Short single-line text.
    Text,
    /// Free-form multi-line text.
    FreeText,
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
    /// Populated by the backend at create time, never taken from the caller.
    pub system: bool,
}

impl FieldSpec {
    const fn input(name: &'static str, ty: FieldType, required: bool) -> Self {
        Self {
            name,
            ty,
            required,
            system: false,
        }
    }

    const fn system(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: true,
            system: true,
        }
    }
}

/// Class of caller a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Principal {
    /// The identity that created the record.
    Owner,
    /// Any caller holding a valid session.
    Authenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthRule {
    pub principal: Principal,
    pub operations: &'static [Operation],
}

/// Operations the owner holds on every kind without an explicit grant.
pub const OWNER_IMPLICIT: &[Operation] = &[Operation::Create, Operation::Update];

#[derive(Debug, PartialEq, Eq)]
pub struct RecordSchema {
    pub kind: RecordKind,
    pub fields: &'static [FieldSpec],
    /// Evaluated in order; the first rule granting the operation wins.
    pub rules: &'static [AuthRule],
    /// Field holding the owning identity.
    pub owner_field: &'static str,
}

pub const PHOTO_SCHEMA: RecordSchema = RecordSchema {
    kind: RecordKind::Photo,
    fields: &[
        FieldSpec::system("id", FieldType::Identifier),
        FieldSpec::system("userId", FieldType::Identifier),
        FieldSpec::input("title", FieldType::Text, true),
        FieldSpec::input("description", FieldType::FreeText, false),
        FieldSpec::input("s3Key", FieldType::Text, true),
        FieldSpec::system("uploadedAt", FieldType::Timestamp),
    ],
    rules: &[
        AuthRule {
            principal: Principal::Owner,
            operations: &[Operation::Read, Operation::Delete],
        },
        AuthRule {
            principal: Principal::Authenticated,
            operations: &[Operation::Read],
        },
    ],
    owner_field: "userId",
};

pub const COMMENT_SCHEMA: RecordSchema = RecordSchema {
    kind: RecordKind::Comment,
    fields: &[
        FieldSpec::system("id", FieldType::Identifier),
        FieldSpec::input("photoId", FieldType::Identifier, true),
        FieldSpec::system("userId", FieldType::Identifier),
        FieldSpec::system("username", FieldType::Text),
        FieldSpec::input("content", FieldType::FreeText, true),
        FieldSpec::system("createdAt", FieldType::Timestamp),
    ],
    rules: &[
        AuthRule {
            principal: Principal::Owner,
            operations: &[Operation::Read, Operation::Delete],
        },
        AuthRule {
            principal: Principal::Authenticated,
            operations: &[Operation::Read, Operation::Create],
        },
    ],
    owner_field: "userId",
};

impl RecordSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether `principal` may perform `op` on this kind.
    pub fn grants(&self, principal: Principal, op: Operation) -> bool {
        let explicit = self
            .rules
            .iter()
            .any(|rule| rule.principal == principal && rule.operations.contains(&op));
        explicit || (principal == Principal::Owner && OWNER_IMPLICIT.contains(&op))
    }

    /// Check the caller's principal classes against the rule list.
    pub fn authorize(&self, op: Operation, principals: &[Principal]) -> ApiResult<()> {
        if principals.iter().any(|p| self.grants(*p, op)) {
            return Ok(());
        }
        if principals.is_empty() {
            return Err(ApiError::authorization(format!(
                "{op} on {} requires a signed-in user",
                self.kind
            )));
        }
        Err(ApiError::authorization(format!(
            "{op} on {} is restricted to its owner",
            self.kind
        )))
    }

    /// Reject a missing or blank value for a required field.
    pub fn require_text(&self, field: &str, value: &str) -> ApiResult<()> {
        let required = self.field(field).map(|f| f.required).unwrap_or(false);
        if required && value.trim().is_empty() {
            return Err(ApiError::validation(format!(
                "{}.{field} is required",
                self.kind
            )));
        }
        Ok(())
    }
}

/// Principal classes held by `caller` against a record owned by `owner`.
///
/// For a create, pass the caller as `owner`: the creator is the prospective
/// owner of the record being written.
pub fn principals_for(caller: Option<&UserId>, owner: Option<&UserId>) -> Vec<Principal> {
    let Some(caller) = caller else {
        return Vec::new();
    };
    let mut principals = Vec::with_capacity(2);
    if owner == Some(caller) {
        principals.push(Principal::Owner);
    }
    principals.push(Principal::Authenticated);
    principals
}
