use std::fmt;

#[derive(Debug)]
pub enum GridError {
    Gpu(String),
    Surface(String),
    Config(String),
    State(String),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GridError::Gpu(msg) => write!(f, "GPU error: {}", msg),
            GridError::Surface(msg) => write!(f, "Surface error: {}", msg),
            GridError::Config(msg) => write!(f, "Config error: {}", msg),
            GridError::State(msg) => write!(f, "State error: {}", msg),
        }
    }
}

impl std::error::Error for GridError {}

pub type Result<T> = std::result::Result<T, GridError>;

// Conversion helpers
impl From<std::io::Error> for GridError {
    fn from(err: std::io::Error) -> Self {
        GridError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        GridError::Config(err.to_string())
    }
}

impl From<wgpu::CreateSurfaceError> for GridError {
    fn from(err: wgpu::CreateSurfaceError) -> Self {
        GridError::Surface(err.to_string())
    }
}

impl From<wgpu::RequestDeviceError> for GridError {
    fn from(err: wgpu::RequestDeviceError) -> Self {
        GridError::Gpu(err.to_string())
    }
}
