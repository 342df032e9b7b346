use std::fmt;
use std::io;
use std::str::FromStr;

use crate::PcError;

/// Identifies a mount namespace.
///
/// This is the inode number shown in the `/proc/<pid>/ns/mnt` symlink, which reads as
/// `mnt:[4026531840]`.  Two processes share a mount namespace exactly when their ids are equal.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct MountNamespaceId(pub u64);

impl FromStr for MountNamespaceId {
    type Err = PcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inode = s
            .trim()
            .strip_prefix("mnt:[")
            .and_then(|s| s.strip_suffix(']'))
            .ok_or_else(|| invalid(s))?;
        let inode = u64::from_str_radix(inode, 10).map_err(|_| invalid(s))?;
        Ok(MountNamespaceId(inode))
    }
}

fn invalid(link: &str) -> PcError {
    PcError::NamespaceLookup(
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{:?} is not a mount namespace link", link),
        ),
        None,
    )
}

impl fmt::Display for MountNamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mnt:[{}]", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_namespace_link() {
        let ns = MountNamespaceId::from_str("mnt:[4026531840]").unwrap();
        assert_eq!(ns, MountNamespaceId(4026531840));
        assert_eq!(ns.to_string(), "mnt:[4026531840]");

        assert_eq!(
            MountNamespaceId::from_str("mnt:[4026532452]\n").unwrap(),
            MountNamespaceId(4026532452)
        );
    }

    #[test]
    fn test_parse_namespace_link_invalid() {
        for link in ["", "net:[4026531840]", "mnt:[]", "mnt:[abc]", "mnt:4026531840"] {
            let err = MountNamespaceId::from_str(link).unwrap_err();
            assert!(matches!(err, PcError::NamespaceLookup(_, None)), "{:?}", link);
        }
    }
}
