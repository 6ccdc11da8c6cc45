//! Binary [`Payload`] layouts of an [`AuthToken`].
//!
//! Every layout is a fixed sequence of big-endian fields:
//!
//! | field        | size              | present in                   |
//! |--------------|-------------------|------------------------------|
//! | version      | 1                 | all                          |
//! | user ID      | [`SLOT_LEN`]      | all                          |
//! | method       | 1                 | all                          |
//! | project ID   | [`SLOT_LEN`]      | [`ProjectScoped`]            |
//! | domain ID    | [`SLOT_LEN`]      | [`DomainScoped`]             |
//! | expires at   | 8 (unix seconds)  | all                          |
//! | audit count  | 1                 | all                          |
//! | audit IDs    | 16 x audit count  | all                          |
//! | checksum     | 8 (XXH3-64)       | all                          |
//!
//! The checksum covers every preceding byte, so a corrupted record never
//! parses as a different [`AuthToken`].
//!
//! [`AuthToken`]: super::AuthToken

use derive_more::{Display, Error};
use xxhash_rust::xxh3;

use crate::domain::{
    audit::AUDIT_ID_LEN,
    domain,
    id::{Slot, SLOT_LEN},
    project, user, AuditId, AuditTrail, IdOf, Method,
};

use super::ExpirationDateTime;

/// Length of the trailing checksum of a [`Payload`].
const CHECKSUM_LEN: usize = 8;

common::define_kind! {
    #[doc = "Version marker of a `Payload` layout."]
    enum Kind {
        #[doc = "`Unscoped` layout."]
        Unscoped = 0,

        #[doc = "`DomainScoped` layout."]
        DomainScoped = 1,

        #[doc = "`ProjectScoped` layout."]
        ProjectScoped = 2,
    }
}

impl Kind {
    /// Order in which [`Kind`]s are matched against undetermined bytes.
    ///
    /// The most specific layouts go first.
    pub const TRIAL_ORDER: [Self; 3] =
        [Self::ProjectScoped, Self::DomainScoped, Self::Unscoped];
}

/// Binary layout of an [`AuthToken`] for one [`Scope`] kind.
///
/// [`AuthToken`]: super::AuthToken
/// [`Scope`]: super::Scope
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Payload {
    /// [`Unscoped`] layout.
    Unscoped(Unscoped),

    /// [`ProjectScoped`] layout.
    ProjectScoped(ProjectScoped),

    /// [`DomainScoped`] layout.
    DomainScoped(DomainScoped),
}

/// [`Payload`] of an identity-only token.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Unscoped {
    /// ID of the authenticated user.
    pub user_id: user::Id,

    /// [`Method`] the user authenticated with.
    pub method: Method,

    /// Expiration of the token.
    pub expires_at: ExpirationDateTime,

    /// [`AuditTrail`] of the token.
    pub audit_ids: AuditTrail,
}

/// [`Payload`] of a project-scoped token.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectScoped {
    /// ID of the authenticated user.
    pub user_id: user::Id,

    /// [`Method`] the user authenticated with.
    pub method: Method,

    /// ID of the project the token is scoped to.
    pub project_id: project::Id,

    /// Expiration of the token.
    pub expires_at: ExpirationDateTime,

    /// [`AuditTrail`] of the token.
    pub audit_ids: AuditTrail,
}

/// [`Payload`] of a domain-scoped token.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DomainScoped {
    /// ID of the authenticated user.
    pub user_id: user::Id,

    /// [`Method`] the user authenticated with.
    pub method: Method,

    /// ID of the domain the token is scoped to.
    pub domain_id: domain::Id,

    /// Expiration of the token.
    pub expires_at: ExpirationDateTime,

    /// [`AuditTrail`] of the token.
    pub audit_ids: AuditTrail,
}

impl Payload {
    /// Returns [`Kind`] of this [`Payload`].
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Self::Unscoped(_) => Kind::Unscoped,
            Self::ProjectScoped(_) => Kind::ProjectScoped,
            Self::DomainScoped(_) => Kind::DomainScoped,
        }
    }

    /// Serializes this [`Payload`] into bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::default();
        w.u8(self.kind().u8());
        match self {
            Self::Unscoped(p) => {
                w.slot(&p.user_id.to_slot());
                w.u8(p.method.u8());
                w.tail(p.expires_at, &p.audit_ids);
            }
            Self::ProjectScoped(p) => {
                w.slot(&p.user_id.to_slot());
                w.u8(p.method.u8());
                w.slot(&p.project_id.to_slot());
                w.tail(p.expires_at, &p.audit_ids);
            }
            Self::DomainScoped(p) => {
                w.slot(&p.user_id.to_slot());
                w.u8(p.method.u8());
                w.slot(&p.domain_id.to_slot());
                w.tail(p.expires_at, &p.audit_ids);
            }
        }
        w.finish()
    }

    /// Parses the `bytes` as a [`Payload`] of the provided [`Kind`].
    ///
    /// # Errors
    ///
    /// - [`DecodeError::Malformed`] if the `bytes` don't follow the layout of
    ///   the [`Kind`] exactly, including a foreign version marker and a
    ///   checksum mismatch;
    /// - [`DecodeError::UnknownMethod`] if the method code is not known.
    pub fn from_bytes(bytes: &[u8], kind: Kind) -> Result<Self, DecodeError> {
        use DecodeError as E;

        let (record, checksum) = bytes
            .split_last_chunk::<CHECKSUM_LEN>()
            .ok_or(E::Malformed("payload is too short"))?;
        if xxh3::xxh3_64(record).to_be_bytes() != *checksum {
            return Err(E::Malformed("checksum mismatch"));
        }

        let mut r = Reader(record);
        if r.u8()? != kind.u8() {
            return Err(E::Malformed("version marker mismatch"));
        }
        let user_id = r.id("user ID")?;
        let method = r.method()?;
        let payload = match kind {
            Kind::Unscoped => {
                let (expires_at, audit_ids) = r.tail()?;
                Self::Unscoped(Unscoped {
                    user_id,
                    method,
                    expires_at,
                    audit_ids,
                })
            }
            Kind::ProjectScoped => {
                let project_id = r.id("project ID")?;
                let (expires_at, audit_ids) = r.tail()?;
                Self::ProjectScoped(ProjectScoped {
                    user_id,
                    method,
                    project_id,
                    expires_at,
                    audit_ids,
                })
            }
            Kind::DomainScoped => {
                let domain_id = r.id("domain ID")?;
                let (expires_at, audit_ids) = r.tail()?;
                Self::DomainScoped(DomainScoped {
                    user_id,
                    method,
                    domain_id,
                    expires_at,
                    audit_ids,
                })
            }
        };
        r.finish()?;
        Ok(payload)
    }
}

/// Error of parsing a [`Payload`].
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum DecodeError {
    /// Bytes don't fit the expected layout.
    #[display("Malformed payload: {_0}")]
    Malformed(#[error(not(source))] &'static str),

    /// Method code has no known [`Method`].
    #[display("Unknown authentication method code: {_0}")]
    UnknownMethod(#[error(not(source))] u8),
}

/// Appending serializer of [`Payload`] fields.
#[derive(Debug, Default)]
struct Writer(Vec<u8>);

impl Writer {
    fn u8(&mut self, v: u8) {
        self.0.push(v);
    }

    fn slot(&mut self, slot: &Slot) {
        self.0.extend_from_slice(slot);
    }

    /// Writes the fields shared by every layout after the scope.
    fn tail(&mut self, expires_at: ExpirationDateTime, audit_ids: &AuditTrail) {
        self.0
            .extend_from_slice(&expires_at.unix_timestamp().to_be_bytes());
        #[expect(
            clippy::cast_possible_truncation,
            reason = "`AuditTrail::MAX` fits into `u8`"
        )]
        self.u8(audit_ids.len() as u8);
        for id in audit_ids.iter() {
            self.0.extend_from_slice(id.as_bytes());
        }
    }

    /// Appends the checksum of everything written so far.
    fn finish(mut self) -> Vec<u8> {
        let checksum = xxh3::xxh3_64(&self.0);
        self.0.extend_from_slice(&checksum.to_be_bytes());
        self.0
    }
}

/// Bounds-checked cursor over [`Payload`] bytes.
#[derive(Debug)]
struct Reader<'b>(&'b [u8]);

impl Reader<'_> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let (head, rest) = self
            .0
            .split_first_chunk::<N>()
            .ok_or(DecodeError::Malformed("payload is too short"))?;
        self.0 = rest;
        Ok(*head)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        self.take::<1>().map(|[b]| b)
    }

    fn id<Of: ?Sized>(
        &mut self,
        what: &'static str,
    ) -> Result<IdOf<Of>, DecodeError> {
        let slot = self.take::<SLOT_LEN>()?;
        IdOf::from_slot(&slot).ok_or(DecodeError::Malformed(what))
    }

    fn method(&mut self) -> Result<Method, DecodeError> {
        let code = self.u8()?;
        Method::from_u8(code).ok_or(DecodeError::UnknownMethod(code))
    }

    /// Reads the fields shared by every layout after the scope.
    fn tail(
        &mut self,
    ) -> Result<(ExpirationDateTime, AuditTrail), DecodeError> {
        use DecodeError as E;

        let expires_at = i64::from_be_bytes(self.take::<8>()?);
        let expires_at = ExpirationDateTime::from_unix_timestamp(expires_at)
            .ok_or(E::Malformed("expiration is out of range"))?;

        let count = usize::from(self.u8()?);
        if self.0.len() != count * AUDIT_ID_LEN {
            return Err(E::Malformed("audit IDs length mismatch"));
        }
        let ids = (0..count)
            .map(|_| self.take::<AUDIT_ID_LEN>().map(AuditId::from_bytes))
            .collect::<Result<Vec<_>, _>>()?;
        let audit_ids = AuditTrail::from_ids(ids)
            .ok_or(E::Malformed("audit IDs count is out of range"))?;

        Ok((expires_at, audit_ids))
    }

    fn finish(self) -> Result<(), DecodeError> {
        self.0
            .is_empty()
            .then_some(())
            .ok_or(DecodeError::Malformed("trailing bytes"))
    }
}

#[cfg(test)]
mod spec {
    use std::collections::HashSet;

    use xxhash_rust::xxh3;

    use crate::domain::{AuditId, AuditTrail, Method};

    use super::{
        DecodeError, DomainScoped, ExpirationDateTime, Kind, Payload,
        ProjectScoped, Unscoped, CHECKSUM_LEN,
    };

    /// Replaces the checksum of the `bytes` with a matching one.
    fn resealed(mut bytes: Vec<u8>) -> Vec<u8> {
        bytes.truncate(bytes.len() - CHECKSUM_LEN);
        let checksum = xxh3::xxh3_64(&bytes);
        bytes.extend_from_slice(&checksum.to_be_bytes());
        bytes
    }

    fn expires_at() -> ExpirationDateTime {
        ExpirationDateTime::from_unix_timestamp(1_700_000_000).unwrap()
    }

    fn unscoped() -> Payload {
        Payload::Unscoped(Unscoped {
            user_id: "u1".parse().unwrap(),
            method: Method::Password,
            expires_at: expires_at(),
            audit_ids: AuditTrail::from_ids(vec![AuditId::from_bytes(
                [7; 16],
            )])
            .unwrap(),
        })
    }

    fn project_scoped() -> Payload {
        Payload::ProjectScoped(ProjectScoped {
            user_id: "u1".parse().unwrap(),
            method: Method::Oidc,
            project_id: "0f8fad5bd9cb469fa16570867728950e".parse().unwrap(),
            expires_at: expires_at(),
            audit_ids: AuditTrail::new().extended().unwrap(),
        })
    }

    fn domain_scoped() -> Payload {
        Payload::DomainScoped(DomainScoped {
            user_id: "u1".parse().unwrap(),
            method: Method::Ldap,
            domain_id: "default".parse().unwrap(),
            expires_at: expires_at(),
            audit_ids: AuditTrail::new(),
        })
    }

    #[test]
    fn version_markers_are_unique() {
        let markers =
            Kind::TRIAL_ORDER.iter().map(|k| k.u8()).collect::<HashSet<_>>();

        assert_eq!(markers.len(), Kind::ALL.len());
        assert_eq!(Kind::TRIAL_ORDER.len(), Kind::ALL.len());
    }

    #[test]
    fn lays_out_fixed_width_fields() {
        let bytes = unscoped().to_bytes();
        assert_eq!(bytes.len(), 1 + 32 + 1 + 8 + 1 + 16 + 8);
        assert_eq!(bytes[0], Kind::Unscoped.u8());
        assert_eq!(bytes[33], Method::Password.u8());
        assert_eq!(&bytes[34..42], &1_700_000_000_i64.to_be_bytes());
        assert_eq!(bytes[42], 1);
        assert_eq!(&bytes[43..59], &[7; 16]);
        assert_eq!(&bytes[59..], &xxh3::xxh3_64(&bytes[..59]).to_be_bytes());

        let bytes = project_scoped().to_bytes();
        assert_eq!(bytes.len(), 1 + 32 + 1 + 32 + 8 + 1 + 2 * 16 + 8);
        assert_eq!(bytes[0], Kind::ProjectScoped.u8());

        let bytes = domain_scoped().to_bytes();
        assert_eq!(bytes.len(), 1 + 32 + 1 + 32 + 8 + 1 + 16 + 8);
        assert_eq!(bytes[0], Kind::DomainScoped.u8());
    }

    #[test]
    fn parses_own_layout() {
        for payload in [unscoped(), project_scoped(), domain_scoped()] {
            let bytes = payload.to_bytes();

            assert_eq!(
                Payload::from_bytes(&bytes, payload.kind()).unwrap(),
                payload,
            );
        }
    }

    #[test]
    fn rejects_foreign_marker() {
        let bytes = project_scoped().to_bytes();

        for kind in [Kind::Unscoped, Kind::DomainScoped] {
            assert_eq!(
                Payload::from_bytes(&bytes, kind),
                Err(DecodeError::Malformed("version marker mismatch")),
            );
        }
    }

    #[test]
    fn rejects_length_mismatch() {
        let bytes = domain_scoped().to_bytes();

        for len in 0..bytes.len() {
            assert!(matches!(
                Payload::from_bytes(&bytes[..len], Kind::DomainScoped),
                Err(DecodeError::Malformed(_)),
            ));
        }

        let mut longer = bytes.clone();
        longer.push(0);
        assert!(Payload::from_bytes(&longer, Kind::DomainScoped).is_err());
    }

    #[test]
    fn rejects_any_corrupted_byte() {
        for payload in [unscoped(), project_scoped(), domain_scoped()] {
            let bytes = payload.to_bytes();

            for i in 0..bytes.len() {
                let mut corrupted = bytes.clone();
                corrupted[i] ^= 0x01;

                assert_eq!(
                    Payload::from_bytes(&corrupted, payload.kind()),
                    Err(DecodeError::Malformed("checksum mismatch")),
                    "flipped byte {i}",
                );
            }
        }
    }

    #[test]
    fn rejects_unknown_method() {
        let mut bytes = unscoped().to_bytes();
        bytes[33] = 0xEE;
        let bytes = resealed(bytes);

        assert_eq!(
            Payload::from_bytes(&bytes, Kind::Unscoped),
            Err(DecodeError::UnknownMethod(0xEE)),
        );
    }

    #[test]
    fn rejects_empty_audit_trail() {
        let mut bytes = unscoped().to_bytes();
        bytes.truncate(42);
        bytes.push(0);
        bytes.extend_from_slice(&[0; CHECKSUM_LEN]);
        let bytes = resealed(bytes);

        assert!(matches!(
            Payload::from_bytes(&bytes, Kind::Unscoped),
            Err(DecodeError::Malformed(_)),
        ));
    }
}
