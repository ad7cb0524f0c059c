use std::error::Error;

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Engine, EngineError};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "family_budget_admin")]
#[command(about = "Admin utilities for the family budget service (bootstrap users/categories)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./family_budget.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Category(Category),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
}

#[derive(Args, Debug)]
struct Category {
    #[command(subcommand)]
    command: CategoryCommand,
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    Create(CategoryCreateArgs),
    Share(CategoryShareArgs),
}

#[derive(Args, Debug)]
struct CategoryCreateArgs {
    /// Owner's user id.
    #[arg(long)]
    owner: i32,
    #[arg(long)]
    name: String,
}

#[derive(Args, Debug)]
struct CategoryShareArgs {
    #[arg(long)]
    category: i32,
    /// Owner's user id.
    #[arg(long)]
    owner: i32,
    /// User id to grant access to.
    #[arg(long)]
    user: i32,
}

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

const PASSWORD_ATTEMPTS: usize = 3;

/// Effect of one key press on a masked line.
#[derive(Debug, PartialEq, Eq)]
enum Keystroke {
    Pending,
    Submit,
    Abort,
}

fn apply_key(line: &mut String, key: KeyEvent) -> Keystroke {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => Keystroke::Submit,
        KeyCode::Esc => Keystroke::Abort,
        KeyCode::Char('c' | 'd') if ctrl => Keystroke::Abort,
        KeyCode::Char('u') if ctrl => {
            line.clear();
            Keystroke::Pending
        }
        KeyCode::Char(ch) if !ctrl => {
            line.push(ch);
            Keystroke::Pending
        }
        KeyCode::Backspace => {
            line.pop();
            Keystroke::Pending
        }
        _ => Keystroke::Pending,
    }
}

/// Reads one line without echoing it. `None` when the operator aborts.
fn read_secret(prompt: &str) -> CliResult<Option<String>> {
    terminal::enable_raw_mode()?;
    let outcome = read_masked_line(prompt);
    let restored = terminal::disable_raw_mode();
    let line = outcome?;
    restored?;
    Ok(line)
}

/// Must run in raw mode. The whole line is redrawn after every key.
fn read_masked_line(prompt: &str) -> CliResult<Option<String>> {
    let mut err = std::io::stderr();
    let mut line = String::new();
    loop {
        execute!(
            err,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print(prompt),
            Print("*".repeat(line.chars().count()))
        )?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        let done = match apply_key(&mut line, key) {
            Keystroke::Pending => continue,
            Keystroke::Submit => Some(line),
            Keystroke::Abort => None,
        };
        execute!(err, Print("\r\n"))?;
        return Ok(done);
    }
}

/// Asks for a new password and its confirmation. `None` when the operator
/// aborts or the entries keep differing.
fn ask_new_password() -> CliResult<Option<String>> {
    for attempt in 1..=PASSWORD_ATTEMPTS {
        let Some(first) = read_secret("New password: ")? else {
            return Ok(None);
        };
        if first.is_empty() {
            eprintln!("An empty password is not allowed ({attempt}/{PASSWORD_ATTEMPTS}).");
            continue;
        }
        let Some(second) = read_secret("Repeat password: ")? else {
            return Ok(None);
        };
        if first == second {
            return Ok(Some(first));
        }
        eprintln!("The two entries differ ({attempt}/{PASSWORD_ATTEMPTS}).");
    }
    Ok(None)
}

async fn connect_db(database_url: &str) -> CliResult<DatabaseConnection> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Prints engine failures the way an operator expects, exiting non-zero.
fn exit_on_error<T>(result: Result<T, EngineError>) -> T {
    match result {
        Ok(value) => value,
        Err(EngineError::Validation(errors)) => {
            eprintln!("invalid input: {errors}");
            std::process::exit(2);
        }
        Err(EngineError::KeyNotFound(what)) => {
            eprintln!("not found: {what}");
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let Some(password) = ask_new_password()? else {
                eprintln!("no password set, user {} not created", args.username);
                std::process::exit(1);
            };
            let user = exit_on_error(
                engine
                    .register(Some(&args.username), Some(&password))
                    .await,
            );

            println!("created user: {} ({})", user.username, user.id);
        }
        Command::Category(Category {
            command: CategoryCommand::Create(args),
        }) => {
            exit_on_error(engine.user(args.owner).await);
            let category = exit_on_error(
                engine
                    .create_category(Some(&args.name), args.owner)
                    .await,
            );
            println!("created category: {} ({})", category.name, category.id);
        }
        Command::Category(Category {
            command: CategoryCommand::Share(args),
        }) => {
            let category = exit_on_error(
                engine
                    .add_category_member(args.category, args.user, args.owner)
                    .await,
            );
            println!(
                "category {} shared with users {:?}",
                category.name, category.users
            );
        }
    }

    Ok(())
}
