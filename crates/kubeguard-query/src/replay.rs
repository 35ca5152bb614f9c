use crate::{QueryError, QueryRunner, RawOutput};
use camino::Utf8PathBuf;
use std::io::ErrorKind;
use kubeguard_domain::policy::{OutputShape, QuerySpec};
use tracing::debug;

/// Serves previously recorded query output from a directory.
///
/// Layout: `<dir>/<resource>.txt` for column queries and `<dir>/<resource>.json` for
/// structured queries, e.g. `pods.txt`, `serviceaccounts.txt`, `psp.json`.
#[derive(Clone, Debug)]
pub struct ReplayRunner {
    dir: Utf8PathBuf,
}

impl ReplayRunner {
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, spec: &QuerySpec) -> Utf8PathBuf {
        let ext = match spec.output {
            OutputShape::Columns(_) => "txt",
            OutputShape::Json => "json",
        };
        self.dir.join(format!("{}.{ext}", spec.resource))
    }
}

impl QueryRunner for ReplayRunner {
    fn invoke(&self, spec: &QuerySpec) -> Result<RawOutput, QueryError> {
        let path = self.path_for(spec);
        debug!(%path, "replaying recorded query output");
        let stdout = std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                QueryError::Replay { path, source }
            } else {
                QueryError::Io {
                    command: format!("replay {path}"),
                    source,
                }
            }
        })?;
        Ok(RawOutput {
            stdout,
            stderr: String::new(),
        })
    }

    fn describe(&self, spec: &QuerySpec) -> String {
        format!("replay {}", self.path_for(spec))
    }
}
