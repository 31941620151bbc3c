//! team-grouping CLI: form teams or pairs from a stored class and edit them.

use std::io;
use std::path::PathBuf;
use std::process;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use team_grouping::render::render_grouping;
use team_grouping::store::{FileSink, GroupingSink, JsonClassStore, RosterSource};
use team_grouping::StoreError;
use team_grouping::{partition_with, Policy, Sex, SortField, Student};

mod interactive;

use interactive::EditOutcome;

#[derive(Parser)]
#[command(name = "team-grouping", version, about = "Form balanced student teams and pairs")]
struct Cli {
    /// Directory holding classes.json
    #[arg(long, default_value = "data", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a class into groups
    Partition {
        /// Class name as stored in classes.json
        #[arg(long)]
        class: String,

        /// Policy name, e.g. "heterogeneous-teams" (see `policies`)
        #[arg(long)]
        policy: String,

        /// Seed for the shuffling policies
        #[arg(long)]
        seed: Option<u64>,

        /// Write the final groups to this file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Edit the groups before exporting
        #[arg(long)]
        edit: bool,
    },

    /// List the available policies
    Policies,

    /// List stored classes
    Classes,

    /// Show statistics for a class
    Stats {
        #[arg(long)]
        class: String,
    },

    /// Create, duplicate or delete classes
    Class {
        #[command(subcommand)]
        action: ClassAction,
    },

    /// Add, remove or change students of a class
    Student {
        #[command(subcommand)]
        action: StudentAction,
    },

    /// List the students of a class
    Students {
        #[arg(long)]
        class: String,

        /// Reorder the class by this field and save the new order
        #[arg(long, value_enum)]
        sort: Option<SortArg>,

        /// Sort in descending order
        #[arg(long, requires = "sort")]
        desc: bool,

        /// Only list students whose name contains this text
        #[arg(long)]
        search: Option<String>,
    },
}

#[derive(Subcommand)]
enum ClassAction {
    /// Create an empty class
    Create { name: String },

    /// Copy a class and its students under a new name
    Duplicate { from: String, to: String },

    /// Delete a class
    Delete { name: String },
}

#[derive(Subcommand)]
enum StudentAction {
    /// Add a student
    Add {
        #[arg(long)]
        class: String,
        name: String,
        score: i64,
        /// M or F
        sex: String,
    },

    /// Remove the student at a 1-based position (see `students`)
    Remove {
        #[arg(long)]
        class: String,
        number: usize,
    },

    /// Replace the student at a 1-based position
    Update {
        #[arg(long)]
        class: String,
        number: usize,
        name: String,
        score: i64,
        sex: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Name,
    Score,
    Sex,
}

impl From<SortArg> for SortField {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => SortField::Name,
            SortArg::Score => SortField::Score,
            SortArg::Sex => SortField::Sex,
        }
    }
}

// Whether stdin is a terminal; piped input runs as a silent batch.
fn stdin_is_terminal() -> bool {
    #[cfg(unix)]
    let is_tty = {
        use std::os::unix::io::AsRawFd;
        unsafe { libc::isatty(io::stdin().as_raw_fd()) == 1 }
    };

    #[cfg(windows)]
    let is_tty = {
        use std::os::windows::io::AsRawHandle;
        let handle = io::stdin().as_raw_handle();
        let mut mode: u32 = 0;
        // GetConsoleMode returns 0 if the handle is not a console
        unsafe {
            #[link(name = "kernel32")]
            extern "system" {
                fn GetConsoleMode(hConsoleHandle: *mut std::ffi::c_void, lpMode: *mut u32) -> i32;
            }
            GetConsoleMode(handle as *mut std::ffi::c_void, &mut mode) != 0
        }
    };

    #[cfg(not(any(unix, windows)))]
    let is_tty = true;

    is_tty
}

fn run_partition(
    data_dir: PathBuf,
    class: String,
    policy: String,
    seed: Option<u64>,
    output: Option<PathBuf>,
    edit: bool,
) -> Result<()> {
    let policy: Policy = policy.parse()?;
    let store = JsonClassStore::new(&data_dir);
    let roster = store
        .load_roster(&class)
        .with_context(|| format!("loading class from {}", store.path().display()))?;
    if roster.len() < 2 {
        bail!("class \"{}\" needs at least 2 students to form teams", class);
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let generated = partition_with(policy, roster.students(), &mut rng);
    info!(class = %class, policy = %policy, groups = generated.len(), "groups formed");

    let grouping = if edit {
        let running = Arc::new(AtomicBool::new(true));
        let r = running.clone();

        // Ctrl+C while editing discards the edits instead of killing the process
        ctrlc::set_handler(move || {
            println!("\n\nCtrl+C pressed; press Enter to discard the edits and show the groups.");
            r.store(false, Ordering::SeqCst);
        })
        .context("installing the Ctrl-C handler")?;

        let stdin = io::stdin();
        let outcome = interactive::run_edit_loop(
            &generated,
            policy,
            &mut rng,
            running,
            stdin_is_terminal(),
            stdin.lock(),
            &mut io::stdout(),
        )?;
        match outcome {
            EditOutcome::Saved(grouping) | EditOutcome::Cancelled(grouping) => grouping,
        }
    } else {
        generated
    };

    let text = render_grouping(&grouping, policy);
    print!("{}", text);

    if let Some(path) = output {
        FileSink::new(&path)
            .save_grouping(&text)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Saved to {}", path.display());
    }
    Ok(())
}

fn run_policies() -> Result<()> {
    for policy in Policy::ALL {
        println!("{:<24} {}", policy.name(), policy.display_name());
    }
    Ok(())
}

fn run_classes(data_dir: PathBuf) -> Result<()> {
    let names = JsonClassStore::new(data_dir).class_names()?;
    if names.is_empty() {
        println!("No classes stored.");
    }
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

fn run_stats(data_dir: PathBuf, class: String) -> Result<()> {
    let roster = JsonClassStore::new(data_dir).load_roster(&class)?;
    let stats = roster.stats();
    println!("Class: {}", class);
    println!("Students: {}", stats.total_students);
    println!("Male: {}  Female: {}", stats.male_count, stats.female_count);
    println!("Average score: {:.2}", stats.average_score);
    println!("Highest: {}  Lowest: {}", stats.highest_score, stats.lowest_score);
    Ok(())
}

fn run_class(data_dir: PathBuf, action: ClassAction) -> Result<()> {
    let store = JsonClassStore::new(data_dir);
    match action {
        ClassAction::Create { name } => {
            let name = store.create_class(&name)?;
            println!("Created class {}", name);
        }
        ClassAction::Duplicate { from, to } => {
            let to = store.duplicate_class(&from, &to)?;
            println!("Copied {} to {}", from, to);
        }
        ClassAction::Delete { name } => {
            if !store.delete_class(&name)? {
                bail!(StoreError::ClassNotFound(name));
            }
            println!("Deleted class {}", name);
        }
    }
    Ok(())
}

fn student_from_args(name: String, score: i64, sex: &str) -> Result<Student> {
    let sex: Sex = sex.parse()?;
    Ok(Student::new(name, score, sex)?)
}

// Positions on the command line count from 1.
fn roster_index(number: usize) -> Result<usize> {
    number.checked_sub(1).context("student numbers start at 1")
}

fn run_student(data_dir: PathBuf, action: StudentAction) -> Result<()> {
    let store = JsonClassStore::new(data_dir);
    match action {
        StudentAction::Add {
            class,
            name,
            score,
            sex,
        } => {
            let mut roster = store.load_roster(&class)?;
            let student = student_from_args(name, score, &sex)?;
            roster.add(student.clone())?;
            store.save_class(&class, &roster)?;
            println!("Added {} to {}", student, class);
        }
        StudentAction::Remove { class, number } => {
            let mut roster = store.load_roster(&class)?;
            let removed = roster.remove(roster_index(number)?)?;
            store.save_class(&class, &roster)?;
            println!("Removed {} from {}", removed, class);
        }
        StudentAction::Update {
            class,
            number,
            name,
            score,
            sex,
        } => {
            let mut roster = store.load_roster(&class)?;
            let student = student_from_args(name, score, &sex)?;
            roster.update(roster_index(number)?, student.clone())?;
            store.save_class(&class, &roster)?;
            println!("Updated student {}: {}", number, student);
        }
    }
    Ok(())
}

fn run_students(
    data_dir: PathBuf,
    class: String,
    sort: Option<SortArg>,
    desc: bool,
    search: Option<String>,
) -> Result<()> {
    let store = JsonClassStore::new(data_dir);
    let mut roster = store.load_roster(&class)?;
    if let Some(field) = sort {
        roster.sort_by(field.into(), !desc);
        store.save_class(&class, &roster)?;
    }

    let listed = match &search {
        Some(term) => roster.search(term),
        None => roster.students().iter().collect(),
    };
    if listed.is_empty() {
        println!("No students found.");
    }
    for student in listed {
        // names are unique, so the match is the student's own position
        let number = roster
            .students()
            .iter()
            .position(|s| s == student)
            .map_or(0, |i| i + 1);
        println!("{:>3}. {}", number, student);
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("team_grouping=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Partition {
            class,
            policy,
            seed,
            output,
            edit,
        } => run_partition(cli.data_dir, class, policy, seed, output, edit),
        Commands::Policies => run_policies(),
        Commands::Classes => run_classes(cli.data_dir),
        Commands::Stats { class } => run_stats(cli.data_dir, class),
        Commands::Class { action } => run_class(cli.data_dir, action),
        Commands::Student { action } => run_student(cli.data_dir, action),
        Commands::Students {
            class,
            sort,
            desc,
            search,
        } => run_students(cli.data_dir, class, sort, desc, search),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
