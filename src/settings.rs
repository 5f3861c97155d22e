use std::path::{Path, PathBuf};

use crate::{fd::is_gzip, fixer::Kind};

#[derive(Debug, Clone)]
pub struct Settings {
    /// Kind of RINEX to fix
    pub kind: Kind,

    /// Input file
    pub input: PathBuf,

    /// Custom output file
    pub output: Option<PathBuf>,

    /// GZIP compression
    pub gzip: bool,
}

impl Settings {
    /// True when the output should be gzip compressed
    pub fn gzip_output(&self) -> bool {
        self.gzip || self.output.as_deref().map(is_gzip).unwrap_or(false)
    }

    /// Output file path. Unless a custom path was defined,
    /// the output is "<stem>_fix.nav" or "<stem>_fix.obs" next to the input.
    pub fn output_path(&self) -> PathBuf {
        if let Some(output) = &self.output {
            return output.clone();
        }

        let directory = self.input.parent().unwrap_or(Path::new(""));

        let mut filename = format!("{}_fix.{}", self.input_stem(), self.kind.extension());

        if self.gzip {
            filename.push_str(".gz");
        }

        directory.join(filename)
    }

    fn input_stem(&self) -> String {
        let input = if is_gzip(&self.input) {
            self.input.with_extension("")
        } else {
            self.input.clone()
        };

        input
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}
