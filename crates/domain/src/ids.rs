use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID value.
            #[must_use]
            pub fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            /// Returns the underlying UUID value.
            #[must_use]
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }
    };
}

uuid_identifier!(
    /// Identifier of a specimen record.
    SpecimenId
);
uuid_identifier!(
    /// Identifier of a collection site.
    SiteId
);
uuid_identifier!(
    /// Identifier of a botanical family.
    FamilyId
);
uuid_identifier!(
    /// Identifier of a taxon (genus + species).
    TaxonId
);
uuid_identifier!(
    /// Identifier of an author, collector or determiner.
    ContributorId
);
uuid_identifier!(
    /// Identifier of a herbarium.
    HerbariumId
);
uuid_identifier!(
    /// Identifier of a node in the geographic hierarchy.
    GeoNodeId
);
uuid_identifier!(
    /// Identifier of a reference coordinate of a vicinity.
    ReferencePointId
);
uuid_identifier!(
    /// Identifier of a taxon image.
    ImageId
);
uuid_identifier!(
    /// Identifier of a generated QR code.
    QrCodeId
);
uuid_identifier!(
    /// Identifier of a recorded QR scan.
    QrScanId
);
uuid_identifier!(
    /// Identifier of a user account.
    UserId
);
uuid_identifier!(
    /// Identifier of an audit log row.
    AuditEntryId
);
