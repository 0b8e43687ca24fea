use std::{fmt, path::PathBuf};

/// A path given on the command line, where `-` stands for the standard input or output.
#[derive(Debug, Clone)]
pub enum PathOrStd {
    Path(PathBuf),
    StdStream,
}

impl From<&std::ffi::OsStr> for PathOrStd {
    fn from(value: &std::ffi::OsStr) -> Self {
        if value == "-" {
            Self::StdStream
        } else {
            Self::Path(value.into())
        }
    }
}

impl fmt::Display for PathOrStd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathOrStd::Path(path) => write!(f, "{}", path.display()),
            PathOrStd::StdStream => f.write_str("-"),
        }
    }
}
