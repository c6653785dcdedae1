use std::fmt;

#[derive(Debug)]
pub enum Error {
    Markup(String),
    Zip(zip::result::ZipError),
    Http(reqwest::Error),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Markup(reason) => write!(f, "unreadable markup: {reason}"),
            Error::Zip(e) => write!(f, "ZIP error: {e}"),
            Error::Http(e) => write!(f, "HTTP client error: {e}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Markup(_) => None,
            Error::Zip(e) => Some(e),
            Error::Http(e) => Some(e),
            Error::Io(e) => Some(e),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::Zip(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        Error::Markup(e.to_string())
    }
}
