/// Availability of the stream-restore extension on the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    Absent,
    Present { version: u32 },
}

impl Extension {
    /// Interpret the protocol version reported by the server; 0 means not loaded
    pub fn from_version(version: u32) -> Self {
        match version {
            0 => Self::Absent,
            version => Self::Present { version },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_zero_is_absent() {
        assert_eq!(Extension::from_version(0), Extension::Absent);
        assert_eq!(Extension::from_version(1), Extension::Present { version: 1 });
    }
}
