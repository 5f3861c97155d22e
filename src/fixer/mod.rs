use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, ErrorKind},
    path::Path,
};

use log::info;

use crate::{
    error::Error,
    fd::{FileDescriptor, InputDescriptor, is_gzip},
    settings::Settings,
};

pub mod navigation;
pub mod observation;

/// Kind of RINEX file to fix
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Kind {
    /// Ephemeris fields reformatting
    Navigation,
    /// Epochs deduplication
    Observation,
}

impl Kind {
    /// File extension of fixed files
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Navigation => "nav",
            Self::Observation => "obs",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Navigation => write!(f, "Navigation"),
            Self::Observation => write!(f, "Observation"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Report {
    Navigation(navigation::Report),
    Observation(observation::Report),
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Navigation(report) => write!(f, "{}", report),
            Self::Observation(report) => write!(f, "{}", report),
        }
    }
}

/// Strips the "\n" or "\r\n" line terminator
pub(crate) fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

fn open_input(path: &Path) -> Result<InputDescriptor, Error> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::InputNotFound(path.to_path_buf()),
        _ => Error::InputUnreadable(path.to_path_buf(), e),
    })?;

    if metadata.is_dir() {
        return Err(Error::InputUnreadable(
            path.to_path_buf(),
            std::io::Error::new(ErrorKind::InvalidInput, "directory specified instead of file"),
        ));
    }

    let fd = File::open(path).map_err(|e| Error::InputUnreadable(path.to_path_buf(), e))?;

    Ok(InputDescriptor::new(is_gzip(path), fd))
}

fn create_output(path: &Path, gzip: bool) -> Result<FileDescriptor, Error> {
    if let Some(directory) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(directory)
            .map_err(|e| Error::OutputPathUnwritable(directory.to_path_buf(), e))?;
    }

    let fd = File::create(path).map_err(|e| Error::OutputPathUnwritable(path.to_path_buf(), e))?;

    Ok(FileDescriptor::new(gzip, fd))
}

fn same_file(lhs: &Path, rhs: &Path) -> bool {
    match (fs::canonicalize(lhs), fs::canonicalize(rhs)) {
        (Ok(lhs), Ok(rhs)) => lhs == rhs,
        _ => false,
    }
}

/// Runs the fixer described by [Settings].
/// The input is opened first: nothing is created if it can't be read.
pub fn run(settings: &Settings) -> Result<Report, Error> {
    let input = settings.input.as_path();
    let output = settings.output_path();

    let reader = BufReader::new(open_input(input)?);

    if same_file(input, &output) {
        return Err(Error::OutputOverwritesInput(output));
    }

    let mut writer = BufWriter::new(create_output(&output, settings.gzip_output())?);

    info!(
        "{} RINEX: \"{}\" -> \"{}\"",
        settings.kind,
        input.display(),
        output.display()
    );

    let report = match settings.kind {
        Kind::Navigation => navigation::fix(reader, &mut writer).map(Report::Navigation),
        Kind::Observation => observation::fix(reader, &mut writer).map(Report::Observation),
    }
    .map_err(|e| match e {
        Error::Read(e) => Error::InputUnreadable(input.to_path_buf(), e),
        Error::Io(e) => Error::OutputPathUnwritable(output.clone(), e),
        e => e,
    })?;

    let fd = writer
        .into_inner()
        .map_err(|e| Error::OutputPathUnwritable(output.clone(), e.into_error()))?;

    fd.finish()
        .map_err(|e| Error::OutputPathUnwritable(output.clone(), e))?;

    Ok(report)
}

#[cfg(test)]
mod test {
    use super::{Kind, Report, run, strip_terminator};
    use crate::{error::Error, settings::Settings};

    use flate2::{Compression, read::GzDecoder, write::GzEncoder};

    use std::{
        fs::{self, File},
        io::{Read, Write},
        path::{Path, PathBuf},
    };

    const OBS: &str = "     3.04           OBSERVATION DATA    M                   RINEX VERSION / TYPE
                                                            END OF HEADER
> 2021 11 24 10 15  0.0000000  0  2
G01  21510832.345   113040122.57507     -1837.615          46.000
G01  21510832.345   113040122.57507     -1837.615          46.000
> 2021 11 24 10 15  0.0000000  0  1
G02  23118442.812   121488319.91206      2204.137          41.250
";

    const NAV: &str = "     3.04           N: GNSS NAV DATA    M: Mixed            RINEX VERSION / TYPE
                                                            END OF HEADER
G01 2021 11 24 10 00 00  .442961230874D-03 -.682121026330D-11                 .0
";

    /// Dedicated test workspace
    fn workspace(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("convbin-fix-{}-{}", std::process::id(), name));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).unwrap();
        path
    }

    fn settings(kind: Kind, input: PathBuf, output: Option<PathBuf>) -> Settings {
        Settings {
            kind,
            input,
            output,
            gzip: false,
        }
    }

    #[test]
    fn terminators() {
        assert_eq!(strip_terminator("G01 ...\n"), "G01 ...");
        assert_eq!(strip_terminator("G01 ...\r\n"), "G01 ...");
        assert_eq!(strip_terminator("G01 ..."), "G01 ...");
        assert_eq!(strip_terminator("\n"), "");
        assert_eq!(strip_terminator("G01 \r \n"), "G01 \r ");
    }

    #[test]
    fn kinds() {
        assert_eq!(Kind::Navigation.extension(), "nav");
        assert_eq!(Kind::Observation.extension(), "obs");
        assert_eq!(Kind::Observation.to_string(), "Observation");
    }

    #[test]
    fn missing_input() {
        let workspace = workspace("missing");
        let output = workspace.join("output.obs");

        let settings = settings(
            Kind::Observation,
            workspace.join("rover.obs"),
            Some(output.clone()),
        );

        match run(&settings) {
            Err(Error::InputNotFound(path)) => assert_eq!(path, workspace.join("rover.obs")),
            other => panic!("unexpected result: {:?}", other),
        }

        assert!(!output.exists());
    }

    #[test]
    fn directory_input() {
        let workspace = workspace("directory");

        let settings = settings(Kind::Navigation, workspace.clone(), None);

        match run(&settings) {
            Err(Error::InputUnreadable(path, _)) => assert_eq!(path, workspace),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn unwritable_output() {
        let workspace = workspace("unwritable");
        let input = workspace.join("rover.nav");
        fs::write(&input, NAV).unwrap();

        // a regular file can't be used as a directory
        let settings = settings(
            Kind::Navigation,
            input.clone(),
            Some(input.join("rover.nav")),
        );

        match run(&settings) {
            Err(Error::OutputPathUnwritable(..)) => {},
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn output_overwriting_input() {
        let workspace = workspace("overwrite");
        let input = workspace.join("rover.obs");
        fs::write(&input, OBS).unwrap();

        let settings = settings(Kind::Observation, input.clone(), Some(input.clone()));

        match run(&settings) {
            Err(Error::OutputOverwritesInput(_)) => {},
            other => panic!("unexpected result: {:?}", other),
        }

        assert_eq!(fs::read_to_string(&input).unwrap(), OBS);
    }

    #[test]
    fn default_output_path() {
        let workspace = workspace("default");
        let input = workspace.join("rover.obs");
        fs::write(&input, OBS).unwrap();

        let report = run(&settings(Kind::Observation, input, None)).unwrap();

        match report {
            Report::Observation(report) => {
                assert_eq!(report.duplicates(), 2);
                assert_eq!(report.epochs, 1);
            },
            other => panic!("unexpected report: {:?}", other),
        }

        let fixed = fs::read_to_string(workspace.join("rover_fix.obs")).unwrap();
        assert!(fixed.contains("> 2021 11 24 10 15  0.0000000  0  2"));
    }

    #[test]
    fn output_directory_creation() {
        let workspace = workspace("mkdir");
        let input = workspace.join("rover.nav");
        fs::write(&input, NAV).unwrap();

        let output = workspace.join("fixed").join("daily").join("rover.nav");

        let report = run(&settings(Kind::Navigation, input, Some(output.clone()))).unwrap();

        match report {
            Report::Navigation(report) => {
                assert_eq!(report.updated, 3);
                assert_eq!(report.records, 1);
            },
            other => panic!("unexpected report: {:?}", other),
        }

        let fixed = fs::read_to_string(&output).unwrap();
        assert!(fixed.ends_with(
            "G01 2021 11 24 10 00 00 4.429612308740E-04-6.821210263300E-12 0.000000000000E+00\n"
        ));
    }

    #[test]
    fn gzip_files() {
        let workspace = workspace("gzip");

        let input = workspace.join("rover.obs.gz");
        let mut encoder = GzEncoder::new(File::create(&input).unwrap(), Compression::new(5));
        encoder.write_all(OBS.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let plain = workspace.join("rover.obs");
        fs::write(&plain, OBS).unwrap();

        let compressed_output = workspace.join("fixed.obs.gz");
        let plain_output = workspace.join("fixed.obs");

        run(&settings(
            Kind::Observation,
            input,
            Some(compressed_output.clone()),
        ))
        .unwrap();

        run(&settings(Kind::Observation, plain, Some(plain_output.clone()))).unwrap();

        let mut decompressed = String::new();
        GzDecoder::new(File::open(&compressed_output).unwrap())
            .read_to_string(&mut decompressed)
            .unwrap();

        assert_eq!(decompressed, fs::read_to_string(&plain_output).unwrap());
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn write_failures_name_the_output() {
        let full = Path::new("/dev/full");

        if !full.exists() {
            return;
        }

        let workspace = workspace("full");
        let input = workspace.join("rover.obs");
        fs::write(&input, OBS).unwrap();

        let settings = settings(Kind::Observation, input, Some(full.to_path_buf()));

        match run(&settings) {
            Err(Error::OutputPathUnwritable(path, _)) => assert_eq!(path, full),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn concatenated_gzip_input() {
        let workspace = workspace("members");
        let input = workspace.join("rover.obs.gz");

        // header and records compressed as two gzip members
        let (header, records) = OBS.split_at(OBS.find('>').unwrap());
        let mut fd = File::create(&input).unwrap();

        for member in [header, records] {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::new(5));
            encoder.write_all(member.as_bytes()).unwrap();
            fd.write_all(&encoder.finish().unwrap()).unwrap();
        }

        drop(fd);

        let output = workspace.join("fixed.obs");
        let report = run(&settings(Kind::Observation, input, Some(output.clone()))).unwrap();

        match report {
            Report::Observation(report) => {
                assert_eq!(report.epochs, 1);
                assert_eq!(report.observations, 2);
            },
            other => panic!("unexpected report: {:?}", other),
        }

        assert!(fs::read_to_string(&output).unwrap().ends_with(
            "G02  23118442.812   121488319.91206      2204.137          41.250\n"
        ));
    }
}
