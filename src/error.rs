//! Defines the general error type for the crate and various conversions into it
use std::convert;
use std::fmt;

/// General error type for the crate
#[derive(Debug)]
pub enum Error {
    DuplicateFileError(String),
    FitParser(fitparser::ErrorKind),
    InvalidConfigurationValue(String),
    Io(std::io::Error),
    MalformedMarkerOrdering(String),
    Other(String),
    SmlParse(String),
    UnorderedSamples(usize),
    UnsupportedFormat(String),
    Yaml(serde_yaml::Error),
}

impl convert::From<fitparser::Error> for Error {
    fn from(err: fitparser::Error) -> Error {
        Error::FitParser(*err)
    }
}

impl convert::From<fitparser::ErrorKind> for Error {
    fn from(err: fitparser::ErrorKind) -> Error {
        Error::FitParser(err)
    }
}

impl convert::From<quick_xml::de::DeError> for Error {
    fn from(err: quick_xml::de::DeError) -> Error {
        Error::SmlParse(err.to_string())
    }
}

impl convert::From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Error {
        Error::Yaml(err)
    }
}

impl convert::From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DuplicateFileError(digest) => write!(
                f,
                "Attempted to convert a file already processed in this run, digest: {}",
                digest
            ),
            Error::FitParser(e) => write!(f, "{}", e),
            Error::InvalidConfigurationValue(msg) => write!(f, "{}", msg),
            Error::Io(e) => write!(f, "{}", e),
            Error::MalformedMarkerOrdering(msg) => {
                write!(f, "Lap markers are not strictly increasing: {}", msg)
            }
            Error::Other(msg) => write!(f, "{}", msg),
            Error::SmlParse(msg) => write!(f, "Failed to read SML data: {}", msg),
            Error::UnorderedSamples(idx) => write!(
                f,
                "Sample {} is earlier than the sample before it, samples must be time ordered",
                idx
            ),
            Error::UnsupportedFormat(ext) => {
                write!(f, "No sample extractor exists for file type: {}", ext)
            }
            Error::Yaml(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}
