//! Typed indices into the flat arrays of the builder.
use std::fmt;

macro_rules! index_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Default, Hash, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord,
            bincode::Encode, bincode::Decode,
        )]
        #[repr(transparent)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl From<usize> for $name {
            fn from(value: usize) -> Self {
                debug_assert!(value <= u32::MAX as usize);
                Self(value as u32)
            }
        }

        impl From<$name> for usize {
            fn from(value: $name) -> Self {
                value.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

index_type!(
    /// Index into a vertex buffer
    VertID
);
index_type!(TriID);
index_type!(
    /// Index into a triangle index buffer. Corner `c` also names the directed edge
    /// running from corner `c` to the next corner of its triangle.
    CornerID
);
index_type!(
    /// Index of an undirected edge inside the simplifier
    EdgeID
);
index_type!(ClusterID);
index_type!(GroupID);

impl CornerID {
    pub fn tri(self) -> TriID {
        TriID(self.0 / 3)
    }

    /// The next corner around the same triangle.
    pub fn next(self) -> CornerID {
        CornerID(self.0 - self.0 % 3 + (self.0 + 1) % 3)
    }
}

impl TriID {
    pub fn corner(self, i: u32) -> CornerID {
        debug_assert!(i < 3);
        CornerID(self.0 * 3 + i)
    }
}
