//! User Access Manager decision engine
//!
//! Evaluates access decisions against a snapshot of groups and hierarchy.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use uam_access::{
    AccessDecision, ActorContext, Snapshot,
    access_control::{AccessEngine, AccessMode, ObjectType},
    config::{AppConfig, LogFormat, load_config},
};

/// Check access to content objects guarded by user groups
#[derive(Parser, Debug)]
#[command(name = "uam-access")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "UAM_ACCESS_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "UAM_ACCESS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Snapshot file (overrides snapshot.path from the configuration)
    #[arg(short, long, env = "UAM_ACCESS_SNAPSHOT")]
    snapshot: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decide whether an actor may access an object
    Check {
        /// Object type (post, page, category, user, role)
        #[arg(value_parser = parse_object_type)]
        object_type: ObjectType,

        /// Object id
        object_id: String,

        /// Access mode (read, write)
        #[arg(long, default_value = "read", value_parser = parse_mode)]
        mode: AccessMode,

        /// Id of the acting user (anonymous if omitted)
        #[arg(long)]
        user: Option<String>,

        /// User level of the acting user
        #[arg(long)]
        level: Option<u32>,

        /// Remote address of the acting user
        #[arg(long)]
        ip: Option<String>,
    },

    /// List the groups covering an object
    Groups {
        #[arg(value_parser = parse_object_type)]
        object_type: ObjectType,

        object_id: String,
    },

    /// List the objects of one type a group covers
    Objects {
        group_id: u64,

        #[arg(value_parser = parse_object_type)]
        object_type: ObjectType,

        /// Include member descendants of assigned objects
        #[arg(long)]
        recursive: bool,
    },
}

fn parse_object_type(s: &str) -> Result<ObjectType, String> {
    ObjectType::try_parse(s).ok_or_else(|| format!("unknown object type '{}'", s))
}

fn parse_mode(s: &str) -> Result<AccessMode, String> {
    AccessMode::try_parse(s).ok_or_else(|| format!("unknown access mode '{}'", s))
}

fn init_logging(config: &AppConfig, level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or(&config.logging.level)));

    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

fn create_engine(config: &AppConfig, snapshot_path: Option<&str>) -> uam_access::Result<AccessEngine> {
    let snapshot = Snapshot::load_configured(config, snapshot_path)
        .inspect_err(|e| error!(error = %e, "Failed to load snapshot"))?;

    Ok(snapshot.into_engine(config.access.clone()))
}

fn run(engine: &AccessEngine, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Check {
            object_type,
            object_id,
            mode,
            user,
            level,
            ip,
        } => {
            let mut actor = match user {
                Some(id) => ActorContext::user(id, level),
                None => ActorContext {
                    level,
                    ..ActorContext::anonymous()
                },
            };
            if let Some(ip) = ip {
                actor = actor.with_remote_addr(&ip);
            }

            match engine.check(object_type, &object_id, &actor, mode)? {
                AccessDecision::Allowed(reason) => println!("allowed: {}", reason),
                AccessDecision::Denied(reason) => println!("denied: {}", reason),
            }
        }
        Command::Groups {
            object_type,
            object_id,
        } => {
            let groups = engine.groups_for_object(object_type, &object_id)?;
            if groups.is_empty() {
                println!("{} {} is not restricted by any group", object_type, object_id);
            }
            for (group_id, entry) in groups {
                let via: Vec<String> = entry
                    .assignment
                    .ancestors()
                    .map(|(ancestor_type, ancestor_id)| format!("{} {}", ancestor_type, ancestor_id))
                    .collect();

                if via.is_empty() {
                    println!("{}\t{}", group_id, entry.group.name());
                } else {
                    println!("{}\t{}\tvia {}", group_id, entry.group.name(), via.join(", "));
                }
            }
        }
        Command::Objects {
            group_id,
            object_type,
            recursive,
        } => {
            let objects = engine
                .objects_for_group(group_id, object_type, recursive)?
                .with_context(|| format!("unknown group {}", group_id))?;
            for (object_id, object_type) in objects {
                println!("{}\t{}", object_type, object_id);
            }
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let config = load_config(args.config.as_deref())?;

    // Initialize logging
    init_logging(&config, args.log_level.as_deref());

    info!(version = env!("CARGO_PKG_VERSION"), "Starting uam-access");

    let engine = create_engine(&config, args.snapshot.as_deref())?;
    run(&engine, args.command)
}
