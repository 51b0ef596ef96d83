mod render;

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use encoding_rs::Encoding;
use tracing::{debug, Level};
use tracker_engine::encounter::DEFAULT_ENCOUNTER_NAME;
use tracker_engine::input::{self, Bounds, Commit};
use tracker_engine::markers::MarkerKind;
use tracker_engine::persist::{self, DocumentKind};
use tracker_engine::store::{self, EncounterStore, FileStore};
use tracker_engine::{
    Combatant, CombatantId, CombatantType, DeathSaveOutcome, Encounter, MarkerId, Resource,
    SaveKind, Session, TrackerConfig, Vital,
};

#[derive(Copy, Clone, ValueEnum)]
enum Kind {
    Pc,
    Enemy,
    Neutral,
    Environment,
    Legendary,
}

#[derive(Copy, Clone, ValueEnum)]
enum State {
    Alive,
    Unconscious,
    Stable,
    Dead,
}

#[derive(Copy, Clone, ValueEnum)]
enum Save {
    Success,
    Failure,
}

#[derive(Copy, Clone, ValueEnum)]
enum Use {
    Action,
    Bonus,
    Reaction,
}

#[derive(Copy, Clone, ValueEnum)]
enum Legendary {
    Action,
    Resistance,
}

/// A token or condition on one combatant.
#[derive(Args)]
struct MarkerTarget {
    /// Combatant: position, name or id
    who: String,
    /// Work on conditions instead of tokens
    #[arg(long)]
    condition: bool,
}

#[derive(Subcommand)]
enum MarkerCmd {
    /// Add a marker (persistent unless a duration is given)
    Add {
        #[command(flatten)]
        target: MarkerTarget,
        #[arg(long)]
        label: Option<String>,
        /// Turns the marker lasts; empty keeps it persistent
        #[arg(long)]
        duration: Option<String>,
    },
    /// Remove a marker
    Remove {
        #[command(flatten)]
        target: MarkerTarget,
        /// Marker: position, label or id
        marker: String,
    },
    /// Change a marker's label
    Rename {
        #[command(flatten)]
        target: MarkerTarget,
        marker: String,
        label: String,
    },
    /// Set the remaining duration; an empty value makes it persistent
    Duration {
        #[command(flatten)]
        target: MarkerTarget,
        marker: String,
        value: String,
    },
    /// Flip between persistent and timed
    Persist {
        #[command(flatten)]
        target: MarkerTarget,
        marker: String,
    },
}

#[derive(Subcommand)]
enum Cmd {
    /// Start a fresh, empty encounter
    New { name: Option<String> },
    /// Print the roster in turn order
    Show {
        /// Also print the event log
        #[arg(long)]
        log: bool,
    },
    /// Add a combatant
    Add {
        name: String,
        #[arg(long = "type", value_enum, default_value_t = Kind::Pc)]
        kind: Kind,
        #[arg(long)]
        hp: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        init: Option<String>,
        #[arg(long)]
        ac: Option<String>,
        /// Movement per turn (defaults to the configured value)
        #[arg(long)]
        movement: Option<String>,
    },
    /// Remove a combatant
    Remove { who: String },
    /// Copy a combatant with fresh ids
    Duplicate { who: String },
    /// Rename a combatant
    Rename { who: String, name: String },
    /// Change a combatant's type
    Retype {
        who: String,
        #[arg(value_enum)]
        kind: Kind,
    },
    /// Set initiative (empty clears) and re-sort
    Init {
        who: String,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Set current hit points (empty clears)
    Hp { who: String, value: String },
    /// Set maximum hit points (empty clears)
    MaxHp { who: String, value: String },
    /// Set armor class (empty clears)
    Ac { who: String, value: String },
    /// Subtract hit points
    Damage { who: String, amount: String },
    /// Add hit points, up to the maximum
    Heal { who: String, amount: String },
    /// Force a vital state
    State {
        who: String,
        #[arg(value_enum)]
        state: State,
    },
    /// Toggle a death-save slot (1-3)
    Save {
        who: String,
        #[arg(value_enum)]
        kind: Save,
        slot: u8,
    },
    /// Toggle a used action, bonus action or reaction
    Use {
        who: String,
        #[arg(value_enum)]
        resource: Use,
    },
    /// Set remaining movement, optionally also the maximum
    Move {
        who: String,
        current: String,
        #[arg(long)]
        max: Option<String>,
    },
    /// Toggle a legendary action or resistance slot (1-3)
    Legendary {
        who: String,
        #[arg(value_enum)]
        kind: Legendary,
        slot: usize,
    },
    /// Manage tokens and conditions
    Token {
        #[command(subcommand)]
        action: MarkerCmd,
    },
    /// Advance to the next turn
    Next,
    /// Go back one turn
    Prev,
    /// Start or pause the encounter clock
    Toggle,
    /// Replace the encounter notes
    Note { text: Vec<String> },
    /// Write `<name>_encounter.json` and refresh the local store
    Export {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Write `<name>_party.json` with the player characters only
    ExportParty {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Load an encounter or party file
    Import {
        file: PathBuf,
        /// Add the file's player characters to the current encounter
        #[arg(long)]
        merge: bool,
    },
    /// Run the encounter interactively with a live clock
    Play,
}

#[derive(Parser)]
#[command(name = "tracker")]
#[command(about = "Initiative and encounter tracker")]
struct Cli {
    /// YAML settings file; missing means defaults
    #[arg(long, global = true, default_value = "tracker.yaml")]
    config: PathBuf,
    /// Directory of the local encounter store (overrides the config)
    #[arg(long, global = true)]
    store: Option<PathBuf>,
    /// Log more to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Cmd,
}

fn to_type(k: Kind) -> CombatantType {
    match k {
        Kind::Pc => CombatantType::Pc,
        Kind::Enemy => CombatantType::Enemy,
        Kind::Neutral => CombatantType::Neutral,
        Kind::Environment => CombatantType::Environment,
        Kind::Legendary => CombatantType::Legendary,
    }
}

fn to_vital(s: State) -> Vital {
    match s {
        State::Alive => Vital::Alive,
        State::Unconscious => Vital::Unconscious,
        State::Stable => Vital::Stable,
        State::Dead => Vital::Dead,
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = TrackerConfig::load_or_default(&cli.config)?;
    if let Some(dir) = cli.store {
        config.store_dir = dir;
    }
    let mut store = FileStore::new(&config.store_dir);
    let mut enc = store.load()?.unwrap_or_default();

    if let Cmd::Play = cli.cmd {
        return play(enc, &config, &mut store);
    }
    if run(cli.cmd, &config, &mut enc)? {
        store.save(&enc)?;
    }
    Ok(())
}

/// Apply one command. Returns true when the encounter changed and the store
/// should be rewritten.
fn run(cmd: Cmd, config: &TrackerConfig, enc: &mut Encounter) -> Result<bool> {
    match cmd {
        Cmd::New { name } => {
            enc.reset(name.unwrap_or_else(|| DEFAULT_ENCOUNTER_NAME.to_string()));
            println!("started {}", enc.name);
        }
        Cmd::Show { log } => {
            println!("{}", render::header(enc));
            print!("{}", render::roster(enc, config.theme));
            if !enc.notes.is_empty() {
                println!("notes: {}", enc.notes);
            }
            if log {
                print!("{}", render::log(enc));
            }
            return Ok(false);
        }
        Cmd::Add {
            name,
            kind,
            hp,
            init,
            ac,
            movement,
        } => {
            let movement = match movement {
                Some(text) => field_u16(&text, Bounds::MOVEMENT, "movement")?,
                None => None,
            };
            let mut c = Combatant::named(name, to_type(kind))
                .with_movement(movement.unwrap_or(config.default_movement));
            if let Some(max) = optional(hp.as_deref(), Bounds::HIT_POINTS, "hit points")? {
                c = c.with_hp(max as u32);
            }
            if let Some(v) = optional(init.as_deref(), Bounds::INITIATIVE, "initiative")? {
                c = c.with_initiative(v as i32);
            }
            c.ac = optional(ac.as_deref(), Bounds::ARMOR_CLASS, "armor class")?.map(|v| v as u32);
            let id = enc.add_combatant(c)?;
            enc.sort_initiative();
            println!("{id}");
        }
        Cmd::Remove { who } => {
            let id = resolve(enc, &who)?;
            let removed = enc.remove_combatant(&id)?;
            println!("removed {}", removed.name);
        }
        Cmd::Duplicate { who } => {
            let id = resolve(enc, &who)?;
            println!("{}", enc.duplicate_combatant(&id)?);
        }
        Cmd::Rename { who, name } => {
            let id = resolve(enc, &who)?;
            enc.rename(&id, name)?;
        }
        Cmd::Retype { who, kind } => {
            let id = resolve(enc, &who)?;
            enc.set_type(&id, to_type(kind))?;
        }
        Cmd::Init { who, value } => {
            let id = resolve(enc, &who)?;
            let v = field(&value, Bounds::INITIATIVE, "initiative")?;
            enc.commit_initiative(&id, v.map(|v| v as i32))?;
        }
        Cmd::Hp { who, value } => {
            let id = resolve(enc, &who)?;
            let v = field(&value, Bounds::HIT_POINTS, "hit points")?;
            enc.set_current_hp(&id, v.map(|v| v as u32))?;
        }
        Cmd::MaxHp { who, value } => {
            let id = resolve(enc, &who)?;
            let v = field(&value, Bounds::HIT_POINTS, "hit points")?;
            enc.set_max_hp(&id, v.map(|v| v as u32))?;
        }
        Cmd::Ac { who, value } => {
            let id = resolve(enc, &who)?;
            let v = field(&value, Bounds::ARMOR_CLASS, "armor class")?;
            enc.set_ac(&id, v.map(|v| v as u32))?;
        }
        Cmd::Damage { who, amount } => {
            let id = resolve(enc, &who)?;
            let amount = required(&amount, Bounds::HIT_POINTS, "damage")?;
            enc.apply_damage(&id, amount as u32)?;
        }
        Cmd::Heal { who, amount } => {
            let id = resolve(enc, &who)?;
            let amount = required(&amount, Bounds::HIT_POINTS, "healing")?;
            enc.heal(&id, amount as u32)?;
        }
        Cmd::State { who, state } => {
            let id = resolve(enc, &who)?;
            enc.set_state(&id, to_vital(state))?;
        }
        Cmd::Save { who, kind, slot } => {
            let id = resolve(enc, &who)?;
            let kind = match kind {
                Save::Success => SaveKind::Success,
                Save::Failure => SaveKind::Failure,
            };
            match enc.toggle_death_save(&id, kind, slot)? {
                DeathSaveOutcome::Ignored => {
                    println!("ignored: death saves need an unconscious combatant and a slot 1-3");
                    return Ok(false);
                }
                DeathSaveOutcome::Recorded => {}
                DeathSaveOutcome::Died => println!("dead"),
                DeathSaveOutcome::Stabilized => println!("stable"),
            }
        }
        Cmd::Use { who, resource } => {
            let id = resolve(enc, &who)?;
            let resource = match resource {
                Use::Action => Resource::Action,
                Use::Bonus => Resource::BonusAction,
                Use::Reaction => Resource::Reaction,
            };
            if !enc.toggle_resource(&id, resource)? {
                bail!("{who} has no action economy");
            }
        }
        Cmd::Move { who, current, max } => {
            let id = resolve(enc, &who)?;
            let current = field_u16(&current, Bounds::MOVEMENT, "movement")?;
            let max = match max {
                Some(text) => field_u16(&text, Bounds::MOVEMENT, "movement")?,
                None => None,
            };
            if !enc.set_movement(&id, current, max)? {
                bail!("{who} has no movement");
            }
        }
        Cmd::Legendary { who, kind, slot } => {
            let id = resolve(enc, &who)?;
            if !(1..=3).contains(&slot) {
                bail!("legendary slots are 1-3");
            }
            match kind {
                Legendary::Action => enc.toggle_legendary_action(&id, slot - 1)?,
                Legendary::Resistance => enc.toggle_legendary_resistance(&id, slot - 1)?,
            }
        }
        Cmd::Token { action } => marker_command(action, enc)?,
        Cmd::Next => {
            let report = enc.next_turn(tracker_engine::no_autosave);
            for m in &report.expired {
                println!("expired: {}", m.label);
            }
            print_turn(enc);
        }
        Cmd::Prev => {
            enc.previous_turn(tracker_engine::no_autosave);
            print_turn(enc);
        }
        Cmd::Toggle => {
            let running = enc.toggle_running();
            println!("{}", if running { "running" } else { "paused" });
        }
        Cmd::Note { text } => enc.notes = text.join(" "),
        Cmd::Export { dir } => {
            let path = store::write_export(&dir, enc)?;
            println!("{}", path.display());
        }
        Cmd::ExportParty { dir } => {
            let path = store::write_party_export(&dir, enc)?;
            println!("{}", path.display());
            return Ok(false);
        }
        Cmd::Import { file, merge } => {
            let text = read_text_auto(&file)?;
            if merge {
                let members = persist::party_members(&text)
                    .with_context(|| format!("failed to import {}", file.display()))?;
                let count = members.len();
                for m in members {
                    enc.add_combatant(m)?;
                }
                enc.sort_initiative();
                println!("merged {count} player characters");
            } else {
                let (kind, loaded) = persist::import(&text)
                    .with_context(|| format!("failed to import {}", file.display()))?;
                *enc = loaded;
                match kind {
                    DocumentKind::Encounter => println!("loaded encounter {}", enc.name),
                    DocumentKind::Party => println!("loaded party {}", enc.name),
                }
            }
        }
        Cmd::Play => bail!("play runs its own loop"),
    }
    Ok(true)
}

fn marker_command(action: MarkerCmd, enc: &mut Encounter) -> Result<()> {
    let kind_of = |t: &MarkerTarget| {
        if t.condition {
            MarkerKind::Condition
        } else {
            MarkerKind::Token
        }
    };
    match action {
        MarkerCmd::Add {
            target,
            label,
            duration,
        } => {
            let (id, kind) = (resolve(enc, &target.who)?, kind_of(&target));
            let duration = match duration {
                Some(text) => field(&text, Bounds::DURATION, "duration")?,
                None => None,
            };
            let marker = enc.add_marker(&id, kind)?;
            if let Some(label) = label {
                enc.rename_marker(&id, kind, &marker, label)?;
            }
            if let Some(d) = duration {
                enc.set_marker_duration(&id, kind, &marker, Some(d as u32))?;
            }
            println!("{marker}");
        }
        MarkerCmd::Remove { target, marker } => {
            let (id, kind) = (resolve(enc, &target.who)?, kind_of(&target));
            let marker = resolve_marker(enc, &id, kind, &marker)?;
            enc.remove_marker(&id, kind, &marker)?;
        }
        MarkerCmd::Rename {
            target,
            marker,
            label,
        } => {
            let (id, kind) = (resolve(enc, &target.who)?, kind_of(&target));
            let marker = resolve_marker(enc, &id, kind, &marker)?;
            enc.rename_marker(&id, kind, &marker, label)?;
        }
        MarkerCmd::Duration {
            target,
            marker,
            value,
        } => {
            let (id, kind) = (resolve(enc, &target.who)?, kind_of(&target));
            let marker = resolve_marker(enc, &id, kind, &marker)?;
            let d = field(&value, Bounds::DURATION, "duration")?;
            enc.set_marker_duration(&id, kind, &marker, d.map(|d| d as u32))?;
        }
        MarkerCmd::Persist { target, marker } => {
            let (id, kind) = (resolve(enc, &target.who)?, kind_of(&target));
            let marker = resolve_marker(enc, &id, kind, &marker)?;
            enc.toggle_marker_persistent(&id, kind, &marker)?;
        }
    }
    Ok(())
}

fn print_turn(enc: &Encounter) {
    match enc.active() {
        Some(c) => println!("round {}: {}", enc.round(), c.name),
        None => println!("round {}: no combatants", enc.round()),
    }
}

/// Parse field text; an empty value clears the field.
fn field(text: &str, bounds: Bounds, what: &str) -> Result<Option<i64>> {
    input::parse_field(text, bounds)
        .map(Commit::value)
        .ok_or_else(|| {
            anyhow!(
                "invalid {what} {text:?}: expected a whole number from {} to {}",
                bounds.min,
                bounds.max
            )
        })
}

fn field_u16(text: &str, bounds: Bounds, what: &str) -> Result<Option<u16>> {
    Ok(field(text, bounds, what)?.map(|v| v as u16))
}

fn optional(text: Option<&str>, bounds: Bounds, what: &str) -> Result<Option<i64>> {
    match text {
        Some(text) => field(text, bounds, what),
        None => Ok(None),
    }
}

fn required(text: &str, bounds: Bounds, what: &str) -> Result<i64> {
    field(text, bounds, what)?.ok_or_else(|| anyhow!("{what} amount is required"))
}

/// Find a combatant by id, 1-based position or (unique) name.
fn resolve(enc: &Encounter, who: &str) -> Result<CombatantId> {
    let roster = enc.roster();
    if let Some(c) = roster.iter().find(|c| c.id.as_str() == who) {
        return Ok(c.id.clone());
    }
    if let Some(c) = who
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| roster.at(i))
    {
        return Ok(c.id.clone());
    }
    let mut named = roster.iter().filter(|c| c.name.eq_ignore_ascii_case(who));
    match (named.next(), named.next()) {
        (Some(c), None) => Ok(c.id.clone()),
        (Some(_), Some(_)) => bail!("{who:?} matches several combatants; use a position or id"),
        (None, _) => bail!("no combatant {who:?}"),
    }
}

fn resolve_marker(
    enc: &Encounter,
    owner: &CombatantId,
    kind: MarkerKind,
    which: &str,
) -> Result<MarkerId> {
    let list = enc
        .combatant(owner)
        .ok_or_else(|| anyhow!("no combatant {owner}"))?
        .markers(kind);
    if let Some(m) = list.iter().find(|m| m.id.as_str() == which) {
        return Ok(m.id.clone());
    }
    if let Some(m) = which
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| list.iter().nth(i))
    {
        return Ok(m.id.clone());
    }
    list.iter()
        .find(|m| m.label.eq_ignore_ascii_case(which))
        .map(|m| m.id.clone())
        .ok_or_else(|| anyhow!("no marker {which:?}"))
}

fn read_text_auto(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    if let Some((enc, bom_len)) = Encoding::for_bom(&bytes) {
        let (cow, _, _) = enc.decode(&bytes[bom_len..]);
        Ok(cow.into_owned())
    } else {
        Ok(String::from_utf8(bytes)?)
    }
}

const PLAY_HELP: &str = "n next | p prev | t start/pause | s show | l log | q quit";

/// Interactive loop. The clock ticks on its own thread while running; the
/// store is rewritten on every turn change when autosave is on, and on exit.
fn play(enc: Encounter, config: &TrackerConfig, store: &mut FileStore) -> Result<()> {
    let mut session = Session::new(enc, config.tick_period());
    println!("{PLAY_HELP}");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let mut turned = None;
        match line?.trim() {
            "n" | "next" => {
                let report = session.with(|e| e.next_turn(|r, t| turned = Some((r, t))));
                for m in &report.expired {
                    println!("expired: {}", m.label);
                }
                session.with(|e| print_turn(e));
            }
            "p" | "prev" => {
                session.with(|e| e.previous_turn(|r, t| turned = Some((r, t))));
                session.with(|e| print_turn(e));
            }
            "t" | "toggle" => {
                let running = session.toggle_running();
                println!("{}", if running { "running" } else { "paused" });
            }
            "s" | "show" => session.with(|e| {
                println!("{}", render::header(e));
                print!("{}", render::roster(e, config.theme));
            }),
            "l" | "log" => session.with(|e| print!("{}", render::log(e))),
            "q" | "quit" => break,
            "" => {}
            _ => println!("{PLAY_HELP}"),
        }
        if let (true, Some((round, turn))) = (config.autosave, turned) {
            store.save(&session.snapshot())?;
            debug!(round, turn, "autosaved");
        }
    }
    store.save(&session.close())
}
