//! Identifiers of directory entities.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
    str::FromStr,
};

use serde::{Serialize, Serializer};
use uuid::Uuid;

/// Length of a compacted [`IdOf`] inside a token payload.
pub const SLOT_LEN: usize = 32;

/// Longest free-form [`IdOf`] fitting into a [`Slot`].
pub const MAX_TEXT_LEN: usize = SLOT_LEN - 1;

/// [`Slot`] tag of a UUID rendered as 32 lower-case hex digits.
const UUID_SIMPLE: u8 = 0xFF;

/// [`Slot`] tag of a UUID rendered in the hyphenated lower-case form.
const UUID_HYPHENATED: u8 = 0xFE;

/// Fixed-width binary form of an [`IdOf`].
pub type Slot = [u8; SLOT_LEN];

/// Opaque identifier of an `Of` entity.
///
/// Only identifiers having a fixed-width binary form are representable:
/// - lower-case UUIDs, either simple or hyphenated;
/// - any other UTF-8 string of `1..=`[`MAX_TEXT_LEN`] bytes.
pub struct IdOf<Of: ?Sized> {
    /// String form of this identifier.
    inner: String,

    /// Type parameter describing the identified entity.
    _of: PhantomData<Of>,
}

impl<Of: ?Sized> IdOf<Of> {
    /// Creates a new [`IdOf`] if the given `id` is representable.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        Form::of(&id).is_some().then(|| Self {
            inner: id,
            _of: PhantomData,
        })
    }

    /// Returns the string form of this [`IdOf`].
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Packs this [`IdOf`] into its [`Slot`].
    #[expect(clippy::missing_panics_doc, reason = "invariant of `IdOf`")]
    #[must_use]
    pub fn to_slot(&self) -> Slot {
        let mut slot = [0; SLOT_LEN];
        match Form::of(&self.inner).expect("`IdOf` is always representable") {
            Form::Simple(uuid) => {
                slot[0] = UUID_SIMPLE;
                slot[1..=16].copy_from_slice(uuid.as_bytes());
            }
            Form::Hyphenated(uuid) => {
                slot[0] = UUID_HYPHENATED;
                slot[1..=16].copy_from_slice(uuid.as_bytes());
            }
            Form::Text(text) => {
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "`Form::Text` never exceeds `MAX_TEXT_LEN`"
                )]
                let len = text.len() as u8;
                slot[0] = len;
                slot[1..=text.len()].copy_from_slice(text.as_bytes());
            }
        }
        slot
    }

    /// Unpacks an [`IdOf`] from the provided [`Slot`].
    ///
    /// [`None`] is returned if the `slot` is not a canonical packing of any
    /// [`IdOf`], including a non-zero padding.
    #[must_use]
    pub fn from_slot(slot: &Slot) -> Option<Self> {
        let (tag, body) = (slot[0], &slot[1..]);
        let (used, padding) = match tag {
            UUID_SIMPLE | UUID_HYPHENATED => body.split_at(16),
            len @ 1..=31 => body.split_at(usize::from(len)),
            _ => return None,
        };
        if padding.iter().any(|b| *b != 0) {
            return None;
        }

        let inner = match tag {
            UUID_SIMPLE => Uuid::from_slice(used).ok()?.simple().to_string(),
            UUID_HYPHENATED => {
                Uuid::from_slice(used).ok()?.hyphenated().to_string()
            }
            _ => {
                let text = std::str::from_utf8(used).ok()?;
                // Text of a valid length is never a UUID form, so the
                // packing stays canonical.
                text.to_owned()
            }
        };
        Some(Self {
            inner,
            _of: PhantomData,
        })
    }

    /// Coerces one kind of [`IdOf`] into another.
    #[must_use]
    pub fn coerce<NewOf: ?Sized>(self) -> IdOf<NewOf> {
        IdOf {
            inner: self.inner,
            _of: PhantomData,
        }
    }
}

/// Representable form of an identifier string.
enum Form<'s> {
    /// Lower-case UUID in the simple form.
    Simple(Uuid),

    /// Lower-case UUID in the hyphenated form.
    Hyphenated(Uuid),

    /// Free-form text.
    Text(&'s str),
}

impl<'s> Form<'s> {
    /// Detects the [`Form`] of the provided `id`.
    fn of(id: &'s str) -> Option<Self> {
        if let Ok(uuid) = Uuid::try_parse(id) {
            if uuid.simple().to_string() == id {
                return Some(Self::Simple(uuid));
            }
            if uuid.hyphenated().to_string() == id {
                return Some(Self::Hyphenated(uuid));
            }
        }
        (1..=MAX_TEXT_LEN)
            .contains(&id.len())
            .then_some(Self::Text(id))
    }
}

impl<Of: ?Sized> Clone for IdOf<Of> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _of: PhantomData,
        }
    }
}

impl<Of: ?Sized> fmt::Debug for IdOf<Of> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Id").field(&self.inner).finish()
    }
}

impl<Of: ?Sized> fmt::Display for IdOf<Of> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

impl<Of: ?Sized> AsRef<str> for IdOf<Of> {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl<Of: ?Sized> Eq for IdOf<Of> {}
impl<Of: ?Sized> PartialEq for IdOf<Of> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<Of: ?Sized> Ord for IdOf<Of> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<Of: ?Sized> PartialOrd for IdOf<Of> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Of: ?Sized> Hash for IdOf<Of> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl<Of: ?Sized> FromStr for IdOf<Of> {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Id`")
    }
}

impl<Of: ?Sized> Serialize for IdOf<Of> {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.inner)
    }
}
