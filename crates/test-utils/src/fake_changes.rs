use phaserun::changes::ChangeSource;
use phaserun::types::GitMode;

/// Change source with a fixed answer, or a fixed error.
#[derive(Debug, Clone, Default)]
pub struct StaticChangeSource {
    files: Vec<String>,
    error: Option<String>,
}

impl StaticChangeSource {
    pub fn new(files: &[&str]) -> Self {
        Self {
            files: files.iter().map(|f| f.to_string()).collect(),
            error: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            files: Vec::new(),
            error: Some(message.to_string()),
        }
    }
}

impl ChangeSource for StaticChangeSource {
    fn changed_files(&self, _mode: GitMode, _reference: Option<&str>) -> anyhow::Result<Vec<String>> {
        match &self.error {
            Some(msg) => Err(anyhow::anyhow!("{msg}")),
            None => Ok(self.files.clone()),
        }
    }
}
