pub mod argparse;
mod config;

use anyhow::Context;

use self::config::{ConfigBuilder, SubtimeConfig};

mod convert {
    use std::str::FromStr;

    use anyhow::Context;
    use subtime_core::{format_time, to_seconds, Retime, Timestamp};

    use super::{argparse, config::SubtimeConfig};

    pub(crate) fn timestamp_seconds(strict: bool, timestamp: &str) -> anyhow::Result<f64> {
        if strict {
            let ts = Timestamp::from_str(timestamp)
                .with_context(|| format!("`{}` is not a valid timestamp", timestamp))?;
            return Ok(ts.as_secs_f64());
        }
        let seconds = to_seconds(timestamp);
        if seconds.is_nan() {
            log::warn!("could not read {:?} as a timestamp", timestamp);
        }
        Ok(seconds)
    }

    pub(crate) fn seconds_timestamp(
        cfg: &SubtimeConfig,
        seconds: f64,
        millis: bool,
    ) -> anyhow::Result<String> {
        if !cfg.strict && !millis {
            return Ok(format_time(seconds));
        }
        let ts = Timestamp::from_seconds(seconds)?;
        Ok(if millis {
            ts.precise(cfg.millis_separator).to_string()
        } else {
            ts.to_string()
        })
    }

    pub(crate) fn to_seconds_cmd(
        cfg: &SubtimeConfig,
        args: &argparse::ToSecondsOpts,
    ) -> anyhow::Result<()> {
        for ts in &args.timestamps {
            println!("{}", timestamp_seconds(cfg.strict, ts)?);
        }
        Ok(())
    }

    pub(crate) fn format_cmd(
        cfg: &SubtimeConfig,
        args: &argparse::FormatOpts,
    ) -> anyhow::Result<()> {
        for &seconds in &args.seconds {
            println!("{}", seconds_timestamp(cfg, seconds, args.millis)?);
        }
        Ok(())
    }

    pub(crate) fn shift_timestamp(
        cfg: &SubtimeConfig,
        timestamp: &str,
        retime: &Retime,
    ) -> anyhow::Result<String> {
        if !cfg.strict {
            return Ok(retime.apply_str(timestamp));
        }
        let ts = Timestamp::from_str(timestamp)
            .with_context(|| format!("`{}` is not a valid timestamp", timestamp))?;
        Ok(Timestamp::from(retime.apply_duration(ts.as_duration())).to_string())
    }

    pub(crate) fn shift_cmd(
        cfg: &SubtimeConfig,
        args: &argparse::ShiftOpts,
    ) -> anyhow::Result<()> {
        let retime = Retime::scale(args.scale).with_offset(args.by);
        log::info!("{}: {}", args.timestamp, retime);
        println!("{}", shift_timestamp(cfg, &args.timestamp, &retime)?);
        Ok(())
    }
}

mod srt {
    use anyhow::Context;
    use subtime_core::{srt, Retime};

    use super::argparse;

    pub(crate) fn build_retime(args: &argparse::RetimeSrtOpts) -> Retime {
        let retime = match (args.fps, args.scale) {
            (Some(fps), _) => Retime::framerate(fps.source, fps.target),
            (None, Some(scale)) => Retime::scale(scale),
            (None, None) => Retime::default(),
        };
        retime.with_offset(args.offset)
    }

    pub(crate) fn retime_srt(args: &argparse::RetimeSrtOpts) -> anyhow::Result<()> {
        let mut doc = srt::read_srt_file(&args.input)
            .with_context(|| format!("could not load subtitles from {:?}", args.input))?;
        let retime = build_retime(args);
        log::info!("retiming {:?} ({} cues): {}", args.input, doc.len(), retime);
        if retime.is_identity() {
            log::warn!("no offset, scale, or frame rate given; output is only renumbered");
        }
        doc.retime(&retime);

        match &args.out {
            Some(out) => {
                std::fs::write(out, doc.to_string())
                    .with_context(|| format!("could not write {:?}", out))?;
                log::info!("wrote {:?}", out);
            }
            None => print!("{}", doc),
        }
        Ok(())
    }
}

fn load_config(args: &argparse::CliOpts) -> anyhow::Result<SubtimeConfig> {
    ConfigBuilder::new()
        .context("could not create config builder")?
        .load_environment(!args.no_env)
        .config_file(args.config.as_deref())
        .context("could not set config file")?
        .strict(args.strict)
        .context("could not set strict mode")?
        .build()
        .context("could not build config")
}

pub fn run_cli(args: &argparse::CliOpts) -> anyhow::Result<()> {
    let cfg = load_config(args)?;
    match &args.subcmd {
        argparse::SubCommand::ToSeconds(opts) => convert::to_seconds_cmd(&cfg, opts),
        argparse::SubCommand::Format(opts) => convert::format_cmd(&cfg, opts),
        argparse::SubCommand::Shift(opts) => convert::shift_cmd(&cfg, opts),
        argparse::SubCommand::RetimeSrt(opts) => srt::retime_srt(opts),
        argparse::SubCommand::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&cfg)?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use std::{ffi::OsString, io::Write};

    use clap::Parser;
    use subtime_core::Retime;

    use super::*;

    fn permissive() -> SubtimeConfig {
        SubtimeConfig {
            strict: false,
            millis_separator: ',',
        }
    }

    fn strict() -> SubtimeConfig {
        SubtimeConfig {
            strict: true,
            ..permissive()
        }
    }

    #[test]
    fn permissive_bad_timestamp_is_nan() {
        assert!(convert::timestamp_seconds(false, "nope").unwrap().is_nan());
    }

    #[test]
    fn strict_bad_timestamp_errors() {
        assert!(convert::timestamp_seconds(true, "nope").is_err());
        assert_eq!(
            convert::timestamp_seconds(true, "00:01:30,250").unwrap(),
            90.25
        );
    }

    #[test]
    fn format_modes() {
        assert_eq!(
            convert::seconds_timestamp(&permissive(), -1.0, false).unwrap(),
            "-1:-1:-1"
        );
        assert!(convert::seconds_timestamp(&strict(), -1.0, false).is_err());
        assert_eq!(
            convert::seconds_timestamp(&permissive(), 90.25, true).unwrap(),
            "00:01:30,250"
        );
        let dotted = SubtimeConfig {
            millis_separator: '.',
            ..permissive()
        };
        assert_eq!(
            convert::seconds_timestamp(&dotted, 90.25, true).unwrap(),
            "00:01:30.250"
        );
    }

    #[test]
    fn shift_modes() {
        let back = Retime::shift(-90.0);
        assert_eq!(
            convert::shift_timestamp(&permissive(), "00:01:00", &back).unwrap(),
            "-1:-1:-30"
        );
        assert_eq!(
            convert::shift_timestamp(&strict(), "00:01:00", &back).unwrap(),
            "00:00:00"
        );
    }

    #[test]
    fn retime_from_args() {
        let args = argparse::CliOpts::parse_from([
            "subtime", "retime-srt", "in.srt", "--fps", "25:24", "--offset", "-2",
        ]);
        let argparse::SubCommand::RetimeSrt(opts) = args.subcmd else {
            panic!("expected retime-srt");
        };
        let retime = srt::build_retime(&opts);
        assert_eq!(retime.offset, -2.0);
        assert_eq!(retime.scale, 25.0 / 24.0);
    }

    #[test]
    fn retime_srt_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.srt");
        let output = dir.path().join("out.srt");
        let mut f = std::fs::File::create(&input).unwrap();
        f.write_all(b"1\n00:00:01,000 --> 00:00:02,000\nHello\n")
            .unwrap();

        let args = argparse::CliOpts::parse_from([
            OsString::from("subtime"),
            OsString::from("retime-srt"),
            input.clone().into_os_string(),
            OsString::from("--offset"),
            OsString::from("1.5"),
            OsString::from("--out"),
            output.clone().into_os_string(),
        ]);
        let argparse::SubCommand::RetimeSrt(opts) = args.subcmd else {
            panic!("expected retime-srt");
        };
        srt::retime_srt(&opts).unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(written, "1\n00:00:02,500 --> 00:00:03,500\nHello\n");
    }
}
