//! Command-line arguments

use std::path::PathBuf;

use clap::{ArgGroup, Args as ClapArgs, Parser, Subcommand};
use wildshape_core::Vec2;

/// Token transform and summon tool for shared tabletop scenes
#[derive(Parser, Debug)]
#[command(name = "wildshape")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Scene document to operate on (defaults to the XDG data dir)
    #[arg(long, value_name = "FILE", global = true)]
    pub doc: Option<PathBuf>,

    /// Acting player's display name
    #[arg(long, value_name = "NAME", global = true)]
    pub player: Option<String>,

    /// Acting player's role as reported by the host ("GM" or "PLAYER")
    #[arg(long, value_name = "ROLE", default_value = "GM", global = true)]
    pub role: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add or list scene tokens
    #[command(subcommand)]
    Token(TokenCommand),

    /// Manage the shared shape library
    #[command(subcommand)]
    Library(LibraryCommand),

    /// Transform tokens into a library shape
    Transform {
        /// Library shape id
        #[arg(long)]
        shape: String,

        /// Size by the shape's library size instead of keeping the footprint
        #[arg(long)]
        library_size: bool,

        /// Tokens to transform
        #[arg(required = true)]
        tokens: Vec<String>,
    },

    /// Revert transformed tokens to their original look
    Revert {
        #[arg(required = true)]
        tokens: Vec<String>,
    },

    /// Summon a library shape as a new token
    Summon {
        #[arg(long)]
        shape: String,

        /// Place next to this token
        #[arg(long, value_name = "TOKEN", conflicts_with = "at")]
        near: Option<String>,

        /// Place at this world position
        #[arg(long, value_name = "X,Y", value_parser = parse_point)]
        at: Option<Vec2>,
    },

    /// Dismiss summoned tokens
    #[command(group(ArgGroup::new("target").required(true).args(["id", "all"])))]
    Unsummon {
        #[arg(long, value_name = "TOKEN")]
        id: Option<String>,

        #[arg(long)]
        all: bool,
    },

    /// List summoned tokens
    Summons,

    /// Show or change local preferences
    Prefs(PrefsArgs),
}

#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Add an image token to the scene
    Add {
        /// Token id (a fresh uuid if omitted)
        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        url: String,

        #[arg(long)]
        width: f64,

        #[arg(long)]
        height: f64,

        #[arg(long, default_value_t = 100.0)]
        dpi: f64,

        #[arg(long, value_name = "X,Y", value_parser = parse_point, default_value = "0,0")]
        at: Vec2,

        #[arg(long, default_value = "")]
        label: String,

        #[arg(long, default_value = "CHARACTER")]
        layer: String,
    },

    /// List every token
    List,
}

#[derive(Subcommand, Debug)]
pub enum LibraryCommand {
    /// List library shapes
    List,

    /// Save a token's image as a library shape
    Save {
        #[arg(long)]
        token: String,

        #[arg(long)]
        name: String,

        /// Footprint in grid cells
        #[arg(long, default_value_t = 1.0)]
        size: f64,

        /// Keep the shape out of the summon list
        #[arg(long)]
        no_summon: bool,
    },

    /// Save several tokens at once; each entry is TOKEN=NAME
    Batch {
        #[arg(required = true, value_parser = parse_batch_entry)]
        entries: Vec<BatchEntry>,

        #[arg(long, default_value_t = 1.0)]
        size: f64,
    },

    /// Remove a shape from the library
    Delete { id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub token: String,
    pub name: String,
}

#[derive(ClapArgs, Debug)]
pub struct PrefsArgs {
    #[arg(long)]
    pub label_indicator: Option<bool>,

    #[arg(long)]
    pub use_library_size: Option<bool>,
}

fn parse_point(s: &str) -> Result<Vec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{}'", s))?;
    let x = x.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let y = y.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok(Vec2::new(x, y))
}

fn parse_batch_entry(s: &str) -> Result<BatchEntry, String> {
    s.split_once('=')
        .map(|(token, name)| BatchEntry {
            token: token.trim().to_string(),
            name: name.trim().to_string(),
        })
        .ok_or_else(|| format!("expected TOKEN=NAME but got '{}'", s))
}
