use serde::{Deserialize, Serialize};

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }
    };
}

row_id!(
    /// Identity of a registered principal (user).
    PrincipalId
);
row_id!(TaskId);
row_id!(WishId);
row_id!(
    /// Identity of a snapshot in the community pool.
    SharedWishId
);

/// Importance level of a task, always within `0..=5`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(try_from = "i64", into = "i64")]
pub struct Importance(u8);

impl Importance {
    /// Validate a raw level. Returns `None` outside `0..=5`.
    pub fn new(level: i64) -> Option<Self> {
        let min = i64::from(crate::constants::MIN_IMPORTANCE);
        let max = i64::from(crate::constants::MAX_IMPORTANCE);
        if (min..=max).contains(&level) {
            Some(Self(level as u8))
        } else {
            None
        }
    }

    pub fn level(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Importance {
    type Error = String;

    fn try_from(level: i64) -> Result<Self, Self::Error> {
        Importance::new(level).ok_or_else(|| {
            format!(
                "importance_level must be between {} and {}, got {level}",
                crate::constants::MIN_IMPORTANCE,
                crate::constants::MAX_IMPORTANCE
            )
        })
    }
}

impl From<Importance> for i64 {
    fn from(importance: Importance) -> Self {
        i64::from(importance.0)
    }
}

impl std::fmt::Display for Importance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
