use std::fmt;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    InputValidation(String),
    TemplateLoad(String),
    FontEmbed(String),
    Layout(String),
    /// Text the selected font cannot draw; affects one row only.
    Encoding(String),
    Pdf(String),
    Archive(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::InputValidation(msg) => write!(f, "invalid input: {msg}"),
            Error::TemplateLoad(msg) => write!(f, "could not load template: {msg}"),
            Error::FontEmbed(msg) => write!(f, "could not embed font: {msg}"),
            Error::Layout(msg) => write!(f, "invalid template layout: {msg}"),
            Error::Encoding(msg) => write!(f, "cannot encode text: {msg}"),
            Error::Pdf(msg) => write!(f, "PDF error: {msg}"),
            Error::Archive(msg) => write!(f, "could not write archive: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl Error {
    /// Errors that abort a whole batch rather than a single row.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Pdf(_) | Error::Encoding(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<lopdf::Error> for Error {
    fn from(e: lopdf::Error) -> Self {
        Error::Pdf(e.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        let line = e.position().map(|p| p.line());
        match line {
            Some(line) => Error::InputValidation(format!("malformed CSV at line {line}: {e}")),
            None => Error::InputValidation(format!("malformed CSV: {e}")),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Layout(e.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::Archive(e.to_string())
    }
}
