//! SubRip (`.srt`) documents: load, retime, write back out.

use std::{fmt, io::Read, path::Path, time::Duration};

use crate::{retime::Retime, timestamp::Timestamp};

const SRT_MILLIS_SEPARATOR: char = ',';

#[derive(Debug, thiserror::Error)]
pub enum SrtError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("could not parse SubRip data: {0}")]
    Parse(String),
}

/// A single subtitle entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

impl From<subrip::Subtitle> for Cue {
    fn from(sub: subrip::Subtitle) -> Self {
        Cue {
            start: sub.start,
            end: sub.end,
            text: sub.text,
        }
    }
}

impl Cue {
    pub fn retime(&mut self, retime: &Retime) {
        self.start = retime.apply_duration(self.start);
        self.end = retime.apply_duration(self.end);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SrtDocument {
    cues: Vec<Cue>,
}

impl SrtDocument {
    pub fn new(cues: Vec<Cue>) -> Self {
        SrtDocument { cues }
    }

    pub fn parse(srt: &str) -> Result<Self, SrtError> {
        let subs = subrip::parse(srt).map_err(|e| SrtError::Parse(format!("{:?}", e)))?;
        log::debug!("parsed {} subtitles", subs.len());
        Ok(SrtDocument::new(subs.into_iter().map(Cue::from).collect()))
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn into_cues(self) -> Vec<Cue> {
        self.cues
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Start of the first cue through the end of the last one.
    pub fn span(&self) -> Option<(Duration, Duration)> {
        let first = self.cues.first()?;
        let last = self.cues.last()?;
        Some((first.start, last.end))
    }

    pub fn retime(&mut self, retime: &Retime) {
        if retime.is_identity() {
            return;
        }
        log::debug!("retiming {} cues: {}", self.cues.len(), retime);
        for cue in &mut self.cues {
            cue.retime(retime);
        }
    }
}

/// Writes SubRip text, renumbering cues from 1.
impl fmt::Display for SrtDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, cue) in self.cues.iter().enumerate() {
            if idx != 0 {
                f.write_str("\n")?;
            }
            writeln!(f, "{}", idx + 1)?;
            writeln!(
                f,
                "{} --> {}",
                Timestamp::from(cue.start).precise(SRT_MILLIS_SEPARATOR),
                Timestamp::from(cue.end).precise(SRT_MILLIS_SEPARATOR)
            )?;
            writeln!(f, "{}", cue.text.trim_end())?;
        }
        Ok(())
    }
}

/// Load a SubRip file from disk.
///
/// SRT files have no declared encoding. Anything that is not valid UTF-8 is
/// decoded as Windows-1252.
pub fn read_srt_file<P: AsRef<Path>>(path: P) -> Result<SrtDocument, SrtError> {
    let contents = read_path_to_string(path.as_ref())?;
    SrtDocument::parse(&contents)
}

fn read_path_to_string(tpath: &Path) -> Result<String, SrtError> {
    let mut f = std::fs::File::open(tpath)?;
    let mut v = Vec::new();
    f.read_to_end(&mut v)?;

    Ok(match String::from_utf8(v) {
        Ok(s) => s,
        Err(e) => {
            let v = e.into_bytes();
            let (text, encoding, replacements) = encoding_rs::WINDOWS_1252.decode(v.as_slice());
            if replacements {
                log::warn!(
                    "could not decode {:?} accurately with {}",
                    tpath,
                    encoding.name()
                );
            }
            text.to_string()
        }
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = include_str!("../test_data/sample.srt");

    fn sample() -> SrtDocument {
        SrtDocument::parse(SAMPLE).expect("test SRT failed to parse")
    }

    #[test]
    fn parse_sample() {
        let doc = sample();
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.cues()[0].start, Duration::from_millis(1000));
        assert_eq!(doc.cues()[1].end, Duration::from_secs(5));
        assert!(doc.cues()[1].text.contains("General Kenobi!"));
    }

    #[test]
    fn span_of_sample() {
        assert_eq!(
            sample().span(),
            Some((Duration::from_secs(1), Duration::from_millis(3_601_999)))
        );
        assert_eq!(SrtDocument::default().span(), None);
    }

    #[test]
    fn write_renumbers_and_formats() {
        let doc = SrtDocument::new(vec![
            Cue {
                start: Duration::from_millis(1500),
                end: Duration::from_millis(2250),
                text: "one\n".to_string(),
            },
            Cue {
                start: Duration::from_secs(3661),
                end: Duration::from_millis(3_662_005),
                text: "two\nlines".to_string(),
            },
        ]);
        assert_eq!(
            doc.to_string(),
            "1\n00:00:01,500 --> 00:00:02,250\none\n\n\
             2\n01:01:01,000 --> 01:01:02,005\ntwo\nlines\n"
        );
    }

    #[test]
    fn retime_shifts_every_cue() {
        let mut doc = sample();
        doc.retime(&Retime::shift(2.0));
        assert_eq!(doc.cues()[0].start, Duration::from_secs(3));
        assert_eq!(doc.cues()[0].end, Duration::from_millis(4500));
        assert_eq!(doc.cues()[2].start, Duration::from_secs(3602));
    }

    #[test]
    fn retime_clamps_early_cues() {
        let mut doc = sample();
        doc.retime(&Retime::shift(-2.0));
        assert_eq!(doc.cues()[0].start, Duration::ZERO);
        assert_eq!(doc.cues()[0].end, Duration::from_millis(500));
    }

    #[test]
    fn written_output_parses_again() {
        let mut doc = sample();
        doc.retime(&Retime::scale(2.0));
        let reparsed = SrtDocument::parse(&doc.to_string()).unwrap();
        assert_eq!(reparsed.len(), doc.len());
        assert_eq!(reparsed.cues()[1].start, Duration::from_millis(6500));
    }

    #[test]
    fn read_utf8_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(SAMPLE.as_bytes()).unwrap();
        let doc = read_srt_file(f.path()).unwrap();
        assert_eq!(doc, sample());
    }

    #[test]
    fn read_windows_1252_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"1\n00:00:01,000 --> 00:00:02,000\nCaf\xe9\n")
            .unwrap();
        let doc = read_srt_file(f.path()).unwrap();
        assert_eq!(doc.cues()[0].text.trim_end(), "Café");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_srt_file(dir.path().join("nope.srt")).unwrap_err();
        assert!(matches!(err, SrtError::Io(_)));
    }
}
