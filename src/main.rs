mod cli;
mod console;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Args, Command, LibraryCommand, TokenCommand};
use console::ConsoleNotifier;
use wildshape_core::library::NewShape;
use wildshape_core::scene::default_storage_path;
use wildshape_core::{
    ImageFileProbe, ImageToken, Layer, Panel, Preferences, Role, SceneDocument, SceneStore, Session, ShapeId, Token,
    TokenId,
};

type CliPanel = Panel<SceneDocument, ImageFileProbe, ConsoleNotifier>;

/// Drive wildshape operations against a scene document on disk
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the requested action succeeded
fn run(args: Args) -> Result<bool> {
    let path = args.doc.unwrap_or_else(default_storage_path);

    if let Command::Prefs(prefs_args) = &args.command {
        let mut prefs = Preferences::load();
        if let Some(on) = prefs_args.label_indicator {
            prefs.label_indicator = on;
        }
        if let Some(on) = prefs_args.use_library_size {
            prefs.use_library_size = on;
        }
        if prefs_args.label_indicator.is_some() || prefs_args.use_library_size.is_some() {
            prefs.save().context("saving preferences")?;
        }
        println!("label_indicator = {}", prefs.label_indicator);
        println!("use_library_size = {}", prefs.use_library_size);
        return Ok(true);
    }

    let doc = SceneDocument::open_or_create(&path).with_context(|| format!("opening {}", path.display()))?;
    let session = Session::new(args.player, Role::parse(&args.role));
    let mut panel = Panel::new(doc, ImageFileProbe, ConsoleNotifier::new())
        .with_prefs(Preferences::load())
        .with_session(session);

    let ok = dispatch(&mut panel, args.command)?;

    let (mut doc, notifier) = panel.into_parts();
    if doc.is_dirty() {
        doc.save().with_context(|| format!("saving {}", path.display()))?;
    }
    Ok(ok && notifier.errors() == 0)
}

fn ids(raw: Vec<String>) -> Vec<TokenId> {
    raw.into_iter().map(TokenId::from).collect()
}

fn dispatch(panel: &mut CliPanel, command: Command) -> Result<bool> {
    let ok = match command {
        Command::Token(TokenCommand::Add {
            id,
            url,
            width,
            height,
            dpi,
            at,
            label,
            layer,
        }) => {
            let id = id.map(TokenId::from).unwrap_or_default();
            let token = ImageToken::new(id, url, width, height, dpi)
                .at(at)
                .labelled(label)
                .on_layer(Layer::parse(&layer));
            let created = panel.store_mut().create_token(token.into())?;
            println!("{}", created.id());
            true
        }
        Command::Token(TokenCommand::List) => {
            for token in panel.store().all_tokens()? {
                print_token(&token);
            }
            true
        }
        Command::Library(LibraryCommand::List) => {
            for shape in panel.library() {
                println!(
                    "{}\t{}\tsize={}\t{}{}",
                    shape.id,
                    shape.name,
                    shape.size,
                    shape.url,
                    if shape.summonable { "" } else { "\t(not summonable)" }
                );
            }
            true
        }
        Command::Library(LibraryCommand::Save {
            token,
            name,
            size,
            no_summon,
        }) => {
            panel.store_mut().select(&[TokenId::from(token)])?;
            panel.save_selection_to_library(&name, size, !no_summon).is_some()
        }
        Command::Library(LibraryCommand::Batch { entries, size }) => {
            let requests: Vec<NewShape> = entries
                .into_iter()
                .map(|e| NewShape::new(e.token.into(), e.name, size))
                .collect();
            panel.save_batch(&requests).is_some()
        }
        Command::Library(LibraryCommand::Delete { id }) => panel.delete_shape(&ShapeId::from(id)),
        Command::Transform {
            shape,
            library_size,
            tokens,
        } => {
            if library_size {
                let prefs = Preferences {
                    use_library_size: true,
                    ..*panel.prefs()
                };
                panel.set_prefs(prefs);
            }
            panel.transform(&ids(tokens), &ShapeId::from(shape)).is_some()
        }
        Command::Revert { tokens } => panel.revert(&ids(tokens)).is_some(),
        Command::Summon { shape, near, at } => {
            let shape = ShapeId::from(shape);
            match (near, at) {
                (Some(near), _) => panel.summon_adjacent(&shape, &TokenId::from(near)).is_some(),
                (None, Some(at)) => panel.summon_at(&shape, at).is_some(),
                (None, None) => panel.summon_pending(&shape).is_some(),
            }
        }
        Command::Unsummon { id: Some(id), .. } => {
            panel.unsummon(&TokenId::from(id));
            true
        }
        Command::Unsummon { id: None, .. } => {
            panel.unsummon_all();
            true
        }
        Command::Summons => {
            for token in panel.summons() {
                print_token(&token);
            }
            true
        }
        Command::Prefs(_) => true,
    };
    Ok(ok)
}

fn print_token(token: &Token) {
    match token {
        Token::Image(t) => {
            let mut flags = Vec::new();
            if let Some(transformed) = &t.ext.transform {
                flags.push(format!("as {}", transformed.state.shape_name));
            }
            if t.ext.summon.is_some() {
                flags.push("summoned".to_string());
            }
            println!(
                "{}\t{}\t{}\t{}\t{:.1} cells\t{}",
                t.id,
                t.layer.as_str(),
                t.label,
                t.position,
                t.cells(),
                flags.join(", ")
            );
        }
        Token::Other(t) => println!("{}\t{}\t{}\t{}", t.id, t.layer.as_str(), t.label, t.position),
    }
}
