use std::borrow::Cow;
use std::io;
use std::path::Path;

/// A named deployment script. The name is only used in diagnostics.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Script {
    name: Cow<'static, str>,
    contents: Cow<'static, str>,
}

impl Script {
    pub fn new(name: impl Into<Cow<'static, str>>, contents: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }

    /// Read a UTF-8 script from disk. The script is named after the file name.
    pub fn from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, contents))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }
}
