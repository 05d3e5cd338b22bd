use std::{path::PathBuf, str::FromStr};

use clap::{Args, Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_FILE;
use crate::domain::LocationId;

#[derive(Parser, Debug)]
#[command(name = "screenprint-pricing", version, about = "Screen print manual pricing calculator")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, global = true, env = "SCREENPRINT_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Price one shirt for a selection
    Quote(QuoteArgs),

    /// List the quantity tiers from the pricing data
    Tiers {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Fetch the pricing bundle and save it for offline use
    Fetch,
}

/// Where the pricing bundle comes from. Live API unless one of these is given.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Read a pricing bundle JSON file instead of calling the API
    #[arg(long, conflicts_with = "offline")]
    pub bundle: Option<PathBuf>,

    /// Use the snapshot saved by the last `fetch`
    #[arg(long)]
    pub offline: bool,
}

#[derive(Args, Debug, Clone)]
pub struct QuoteArgs {
    /// Quantity tier label, e.g. 37-72
    #[arg(short, long)]
    pub tier: Option<String>,

    /// Front design colors (0 for no front print)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=6))]
    pub colors: u8,

    /// Light garment (no white underbase)
    #[arg(long)]
    pub light: bool,

    /// Safety stripes on the front print
    #[arg(long)]
    pub front_stripes: bool,

    /// Base garment cost before margin
    #[arg(short, long, default_value = "0")]
    pub garment_cost: String,

    /// Additional location as LOCATION:COLORS[:stripes], e.g. back:2 (repeatable, max 3)
    #[arg(short, long = "location")]
    pub locations: Vec<LocationArg>,

    /// Style number shown in the summary
    #[arg(long)]
    pub style: Option<String>,

    #[arg(long)]
    pub garment_color: Option<String>,

    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationArg {
    pub location_id: LocationId,
    pub colors: u8,
    pub safety_stripes: bool,
}

impl FromStr for LocationArg {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut parts = value.split(':');
        let location_id = parts
            .next()
            .ok_or_else(|| "missing location".to_string())?
            .parse::<LocationId>()?;
        let colors = match parts.next() {
            Some(raw) => raw
                .trim()
                .parse::<u8>()
                .map_err(|_| format!("invalid color count '{raw}'"))?,
            None => 1,
        };
        let safety_stripes = match parts.next() {
            Some(flag) if flag.eq_ignore_ascii_case("stripes") => true,
            Some(other) => return Err(format!("unknown location option '{other}'")),
            None => false,
        };
        if parts.next().is_some() {
            return Err(format!("too many fields in '{value}'"));
        }
        Ok(Self {
            location_id,
            colors,
            safety_stripes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_arg_forms() {
        assert_eq!(
            "back:2".parse::<LocationArg>(),
            Ok(LocationArg {
                location_id: LocationId::Back,
                colors: 2,
                safety_stripes: false,
            })
        );
        assert_eq!(
            "left-sleeve:1:stripes".parse::<LocationArg>().unwrap().safety_stripes,
            true
        );
        assert_eq!("custom".parse::<LocationArg>().unwrap().colors, 1);
        assert!("back:x".parse::<LocationArg>().is_err());
        assert!("back:2:glitter".parse::<LocationArg>().is_err());
        assert!("pocket:2".parse::<LocationArg>().is_err());
    }

    #[test]
    fn quote_command_parses() {
        let cli = Cli::try_parse_from([
            "screenprint-pricing",
            "quote",
            "--tier",
            "37-72",
            "--colors",
            "3",
            "--garment-cost",
            "4.25",
            "-l",
            "back:2",
            "--bundle",
            "bundle.json",
        ])
        .unwrap();

        let Commands::Quote(args) = cli.command else {
            panic!("expected quote command");
        };
        assert_eq!(args.tier.as_deref(), Some("37-72"));
        assert_eq!(args.colors, 3);
        assert_eq!(args.locations.len(), 1);
        assert_eq!(args.source.bundle, Some(PathBuf::from("bundle.json")));
    }

    #[test]
    fn bundle_and_offline_conflict() {
        assert!(Cli::try_parse_from([
            "screenprint-pricing",
            "tiers",
            "--bundle",
            "b.json",
            "--offline"
        ])
        .is_err());
    }
}
