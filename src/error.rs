use std::fmt;

#[derive(Debug)]
pub enum LayoutError {
    InvalidSpec(String),
    InvalidConfiguration(String),
    Font(String),
    Io(std::io::Error),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::InvalidSpec(message) => {
                write!(f, "invalid table spec: {}", message)
            }
            LayoutError::InvalidConfiguration(message) => {
                write!(f, "invalid configuration: {}", message)
            }
            LayoutError::Font(message) => write!(f, "font error: {}", message),
            LayoutError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LayoutError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LayoutError {
    fn from(value: std::io::Error) -> Self {
        LayoutError::Io(value)
    }
}
