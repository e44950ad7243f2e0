use std::{path::PathBuf, str::FromStr};

use clap::{Parser, Subcommand};

pub fn get_args() -> CliOpts {
    CliOpts::parse()
}

#[derive(Parser, Debug)]
#[clap(version = clap::crate_version!())]
pub struct CliOpts {
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Config file to use instead of the default `subtime.toml`
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Reject malformed timestamps instead of producing NaN
    #[clap(long, global = true)]
    pub strict: bool,

    /// Ignore SUBTIME_* environment variables
    #[clap(long, global = true)]
    pub no_env: bool,

    #[clap(subcommand)]
    pub subcmd: SubCommand,
}

#[derive(Subcommand, Debug)]
pub enum SubCommand {
    /// Convert timestamps to a number of seconds
    ToSeconds(ToSecondsOpts),

    /// Format a number of seconds as a timestamp
    Format(FormatOpts),

    /// Shift and/or scale a single timestamp
    Shift(ShiftOpts),

    /// Retime every cue in a SubRip file
    RetimeSrt(RetimeSrtOpts),

    /// Show the resolved configuration
    ShowConfig,
}

#[derive(Parser, Debug)]
pub struct ToSecondsOpts {
    /// Timestamps like `01:02:03,500`
    #[clap(required = true)]
    pub timestamps: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct FormatOpts {
    #[clap(required = true, allow_negative_numbers = true)]
    pub seconds: Vec<f64>,

    /// Include milliseconds
    #[clap(long)]
    pub millis: bool,
}

#[derive(Parser, Debug)]
pub struct ShiftOpts {
    pub timestamp: String,

    /// Seconds to add (may be negative)
    #[clap(long, allow_negative_numbers = true, default_value_t = 0.0)]
    pub by: f64,

    /// Factor applied before the shift
    #[clap(long, default_value_t = 1.0)]
    pub scale: f64,
}

#[derive(Parser, Debug)]
pub struct RetimeSrtOpts {
    /// The SubRip file to read
    pub input: PathBuf,

    /// Seconds to add to every cue (may be negative)
    #[clap(long, allow_negative_numbers = true, default_value_t = 0.0)]
    pub offset: f64,

    /// Factor applied to every cue before the offset
    #[clap(long, conflicts_with = "fps")]
    pub scale: Option<f64>,

    /// Convert between frame rates, as `SOURCE:TARGET` (e.g. `25:23.976`)
    #[clap(long)]
    pub fps: Option<FrameRates>,

    /// Write here instead of stdout
    #[clap(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRates {
    pub source: f64,
    pub target: f64,
}

impl FromStr for FrameRates {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (source, target) = s
            .split_once(':')
            .ok_or_else(|| format!("expected SOURCE:TARGET, got {:?}", s))?;
        let rate = |v: &str| -> Result<f64, String> {
            match v.trim().parse::<f64>() {
                Ok(r) if r.is_finite() && r > 0.0 => Ok(r),
                _ => Err(format!("invalid frame rate: {:?}", v)),
            }
        };
        Ok(FrameRates {
            source: rate(source)?,
            target: rate(target)?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(args: &[&str]) -> CliOpts {
        CliOpts::try_parse_from(std::iter::once("subtime").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        CliOpts::command().debug_assert();
    }

    #[test]
    fn verbose_counts() {
        let args = parse(&["-vv", "show-config"]);
        assert_eq!(args.verbose, 2);
        assert!(matches!(args.subcmd, SubCommand::ShowConfig));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args = parse(&["to-seconds", "00:00:01", "--strict", "-v"]);
        assert!(args.strict);
        assert_eq!(args.verbose, 1);
    }

    #[test]
    fn negative_shift() {
        let args = parse(&["shift", "00:01:00", "--by", "-1.5"]);
        match args.subcmd {
            SubCommand::Shift(opts) => {
                assert_eq!(opts.by, -1.5);
                assert_eq!(opts.scale, 1.0);
            }
            other => panic!("unexpected subcommand: {:?}", other),
        }
    }

    #[test]
    fn negative_seconds_to_format() {
        let args = parse(&["format", "-1", "3661"]);
        match args.subcmd {
            SubCommand::Format(opts) => assert_eq!(opts.seconds, vec![-1.0, 3661.0]),
            other => panic!("unexpected subcommand: {:?}", other),
        }
    }

    #[test]
    fn fps_conflicts_with_scale() {
        let res = CliOpts::try_parse_from([
            "subtime", "retime-srt", "in.srt", "--fps", "25:24", "--scale", "2",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn frame_rates() {
        assert_eq!(
            FrameRates::from_str("25:23.976").unwrap(),
            FrameRates {
                source: 25.0,
                target: 23.976
            }
        );
        assert!(FrameRates::from_str("25").is_err());
        assert!(FrameRates::from_str("25:0").is_err());
        assert!(FrameRates::from_str("x:24").is_err());
    }
}
