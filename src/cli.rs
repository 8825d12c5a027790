use crate::config::SweepConfig;
use crate::error::{Error, Result};
use crate::power::Window;
use crate::sweep::SweepMode;

use std::time::Duration;

/// Options that only matter to the demo binary.
#[derive(Clone, Debug, PartialEq)]
pub struct DemoOptions {
    /// Stop a continuous sweep after this many laps.
    pub laps: Option<u64>,
    /// Where the simulated receiver sits, in degrees from broadside.
    pub target_angle_deg: f64,
    pub verbosity: u64,
}

pub fn setup<'a, 'b>(app: clap::App<'a, 'b>) -> clap::App<'a, 'b> {
    use clap::Arg;
    app.arg(Arg::with_name("start")
            .long("start")
            .value_name("DEG")
            .help("first phase of the sweep")
            .default_value("-180")
            .allow_hyphen_values(true)
            .takes_value(true))
        .arg(Arg::with_name("stop")
             .long("stop")
             .value_name("DEG")
             .help("last phase of the sweep")
             .default_value("180")
             .allow_hyphen_values(true)
             .takes_value(true))
        .arg(Arg::with_name("step")
             .long("step")
             .value_name("DEG")
             .help("phase increment")
             .default_value("2")
             .takes_value(true))
        .arg(Arg::with_name("samples")
             .short("n")
             .long("samples")
             .value_name("N")
             .help("samples per capture")
             .default_value("4096")
             .takes_value(true))
        .arg(Arg::with_name("rate")
             .long("rate")
             .value_name("HZ")
             .help("sample rate")
             .default_value("2000000")
             .takes_value(true))
        .arg(Arg::with_name("tone")
             .long("tone")
             .value_name("HZ")
             .help("baseband test tone frequency")
             .default_value("500000")
             .takes_value(true))
        .arg(Arg::with_name("continuous")
             .short("c")
             .long("continuous")
             .help("repeat the sweep until stopped"))
        .arg(Arg::with_name("laps")
             .long("laps")
             .value_name("N")
             .help("stop a continuous sweep after N laps")
             .takes_value(true))
        .arg(Arg::with_name("settle")
             .long("settle")
             .value_name("N")
             .help("captures discarded after each phase write")
             .default_value("0")
             .takes_value(true))
        .arg(Arg::with_name("delay")
             .long("delay")
             .value_name("MS")
             .help("pause after each step")
             .default_value("0")
             .takes_value(true))
        .arg(Arg::with_name("window")
             .long("window")
             .value_name("WINDOW")
             .possible_values(&["hann", "rect"])
             .default_value("hann")
             .takes_value(true))
        .arg(Arg::with_name("keep-dc")
             .long("keep-dc")
             .help("do not subtract the capture mean"))
        .arg(Arg::with_name("integrate")
             .long("integrate")
             .value_name("BINS")
             .help("sum power over this many bins either side of the tone")
             .default_value("0")
             .takes_value(true))
        .arg(Arg::with_name("search")
             .long("search")
             .value_name("BINS")
             .help("look for the tone this many bins either side")
             .default_value("0")
             .takes_value(true))
        .arg(Arg::with_name("spacing")
             .long("spacing")
             .value_name("D/LAMBDA")
             .help("element spacing in wavelengths")
             .default_value("0.5")
             .takes_value(true))
        .arg(Arg::with_name("spacing-m")
             .long("spacing-m")
             .value_name("METRES")
             .help("element spacing in metres, needs --carrier")
             .requires("carrier")
             .takes_value(true))
        .arg(Arg::with_name("carrier")
             .long("carrier")
             .value_name("HZ")
             .help("carrier frequency")
             .takes_value(true))
        .arg(Arg::with_name("saturate")
             .long("saturate")
             .help("clamp steering angles at ±90° instead of failing"))
        .arg(Arg::with_name("target")
             .long("target")
             .value_name("DEG")
             .help("simulated receiver direction from broadside")
             .default_value("0")
             .allow_hyphen_values(true)
             .takes_value(true))
        .arg(Arg::with_name("verbose")
             .short("v")
             .multiple(true)
             .help("more logging"))
}

fn value<T>(matches: &clap::ArgMatches, name: &str) -> Result<T>
where
    T: std::str::FromStr,
{
    let raw = matches.value_of(name)
        .ok_or_else(|| Error::invalid(format!("missing --{}", name)))?;
    raw.parse()
        .map_err(|_| Error::invalid(format!("bad value for --{}: {:?}", name, raw)))
}

fn optional<T>(matches: &clap::ArgMatches, name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
{
    if matches.is_present(name) {
        value(matches, name).map(Some)
    } else {
        Ok(None)
    }
}

/// Build and validate a configuration from parsed arguments.
pub fn config_from(matches: &clap::ArgMatches) -> Result<(SweepConfig, DemoOptions)> {
    let mut cfg = SweepConfig {
        start_deg: value(matches, "start")?,
        stop_deg: value(matches, "stop")?,
        step_deg: value(matches, "step")?,
        n_samples: value(matches, "samples")?,
        sample_rate: value(matches, "rate")?,
        tone_freq: value(matches, "tone")?,
        mode: if matches.is_present("continuous") {
            SweepMode::Continuous
        } else {
            SweepMode::OneShot
        },
        settle_captures: value(matches, "settle")?,
        step_delay: Duration::from_millis(value(matches, "delay")?),
        window: match matches.value_of("window") {
            Some("rect") => Window::Rectangular,
            _ => Window::Hann,
        },
        remove_dc: !matches.is_present("keep-dc"),
        integration_bins: value(matches, "integrate")?,
        peak_search_bins: value(matches, "search")?,
        spacing_wavelengths: value(matches, "spacing")?,
        saturate_angles: matches.is_present("saturate"),
        ..SweepConfig::default()
    };
    if let Some(metres) = optional::<f64>(matches, "spacing-m")? {
        let carrier: f64 = value(matches, "carrier")?;
        cfg.physical_spacing(metres, carrier);
    }
    cfg.validate()?;

    let demo = DemoOptions {
        laps: optional(matches, "laps")?,
        target_angle_deg: value(matches, "target")?,
        verbosity: matches.occurrences_of("verbose"),
    };
    Ok((cfg, demo))
}
