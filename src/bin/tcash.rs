use std::{
    env,
    io::{self, BufRead, Write},
    path::PathBuf,
    process::ExitCode,
    sync::Arc,
};

use clap::{Parser, Subcommand};
use time::OffsetDateTime;

use tcash::{
    Alert, AlertType, ClientConfig, Error, FileTokenCache, Identity, IdentityProvider,
    SessionIdentityProvider, UserId,
    api::{HttpLedgerApi, LedgerApi},
    format::{format_balance, format_timestamp, format_transaction_amount, greeting, to_local},
    models::{NoteDraft, RecordId, Transaction, TransactionDraft, TransactionType},
    setup_logging,
    view_model::{
        HomeViewModel, ListSource, LoadOutcome, MutationOutcome, NotesViewModel,
        ProfileViewModel, RemoteListViewModel, TransactionsViewModel,
    },
};

/// The session file used when neither `--session-file` nor
/// `TCASH_SESSION_FILE` is given, relative to the home directory.
const DEFAULT_SESSION_FILE: &str = ".tcash-session.json";

/// Keep track of your cash ins, cash outs and notes.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The ledger API to talk to, overrides `TCASH_API_URL`.
    #[arg(long)]
    api_url: Option<String>,

    /// The canonical timezone to show times in, e.g. "Asia/Manila".
    /// Overrides `TCASH_TIMEZONE`.
    #[arg(long)]
    timezone: Option<String>,

    /// Where to keep the session, overrides `TCASH_SESSION_FILE`.
    #[arg(long)]
    session_file: Option<PathBuf>,

    /// Also write debug logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a session.
    SignIn {
        /// Your user ID.
        #[arg(long)]
        user_id: String,
        /// Your e-mail address.
        #[arg(long, default_value = "")]
        email: String,
        /// Prompt for a session token to send with every request.
        #[arg(long)]
        with_token: bool,
    },
    /// End the session.
    SignOut,
    /// Show your balance and latest transactions.
    Home,
    /// List your transactions, newest first.
    Transactions {
        /// Only show transactions whose reference number contains this text.
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Record money paid in.
    CashIn {
        /// The reference number, e.g. from the receipt.
        #[arg(long)]
        ref_number: String,
        /// The amount, e.g. 100.00.
        #[arg(long)]
        amount: String,
    },
    /// Record money paid out.
    CashOut {
        /// The reference number, e.g. from the receipt.
        #[arg(long)]
        ref_number: String,
        /// The amount, e.g. 100.00.
        #[arg(long)]
        amount: String,
    },
    /// Delete a transaction after confirming.
    DeleteTransaction {
        /// The ID of the transaction.
        id: RecordId,
    },
    /// List your notes.
    Notes {
        /// Only show notes containing this text.
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Write a note.
    AddNote {
        /// The text of the note.
        content: String,
    },
    /// Delete a note after confirming.
    DeleteNote {
        /// The ID of the note.
        id: RecordId,
    },
    /// Set your balance.
    SetBalance {
        /// The new balance, e.g. 1500.
        #[arg(allow_hyphen_values = true)]
        balance: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(args.log_file.as_deref());

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::AuthNotReady) => {
            print_error("You are not signed in. Run `tcash sign-in` first.");
            ExitCode::FAILURE
        }
        Err(error) => {
            tracing::debug!("Command failed: {error}");
            if let Some(alert) = error.to_alert() {
                print_alert(&alert);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Error> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &args.api_url {
        config = config.with_api_base_url(url)?;
    }
    if let Some(timezone) = &args.timezone {
        config = config.with_timezone(timezone)?;
    }

    let session_file = args.session_file.clone().unwrap_or_else(default_session_file);
    let provider = SessionIdentityProvider::new(Arc::new(FileTokenCache::new(&session_file)));
    provider.restore();

    let api: Arc<dyn LedgerApi> = Arc::new(HttpLedgerApi::new(&config)?);
    let identity = provider.ready_identity();
    let identity = identity.as_ref();

    match args.command {
        Command::SignIn {
            user_id,
            email,
            with_token,
        } => {
            let mut new_identity = Identity::new(UserId::new(&user_id)?, &email);
            if with_token {
                match rpassword::prompt_password("Session token: ") {
                    Ok(token) => new_identity = new_identity.with_token(&token),
                    Err(error) => {
                        print_error(format!("Could not read token from stdin: {error}"));
                        return Ok(());
                    }
                }
            }

            provider.sign_in(new_identity);
            println!("Signed in. Session saved to {}", session_file.display());
        }
        Command::SignOut => {
            provider.sign_out();
            println!("Signed out.");
        }
        Command::Home => {
            let home = HomeViewModel::new(api, &config);
            require_identity(home.load(identity).await?)?;
            let state = home.state();

            let name = identity.map(Identity::display_name).unwrap_or("User");
            let hour = to_local(OffsetDateTime::now_utc(), &config.timezone).hour();
            println!("Good {}, {name}!", greeting(hour));
            println!("Balance: {}", format_balance(state.balance));
            println!();
            println!("Recent transactions");
            print_transactions(&state.recent, &config.timezone);
        }
        Command::Transactions { search } => {
            let transactions = TransactionsViewModel::new(api);
            require_identity(transactions.load(identity).await?)?;
            transactions.set_query(search.as_deref().unwrap_or_default());
            print_transactions(&transactions.view(), &config.timezone);
        }
        Command::CashIn { ref_number, amount } => {
            let transactions = TransactionsViewModel::new(api);
            let draft = TransactionDraft::new(TransactionType::CashIn, &ref_number, &amount);
            report_mutation(transactions.create(identity, draft).await?);
        }
        Command::CashOut { ref_number, amount } => {
            let transactions = TransactionsViewModel::new(api);
            let draft = TransactionDraft::new(TransactionType::CashOut, &ref_number, &amount);
            report_mutation(transactions.create(identity, draft).await?);
        }
        Command::DeleteTransaction { id } => {
            let transactions = TransactionsViewModel::new(api);
            delete_with_confirmation(&transactions, identity, id, "transaction").await?;
        }
        Command::Notes { search } => {
            let notes = NotesViewModel::new(api);
            require_identity(notes.load(identity).await?)?;
            notes.set_query(search.as_deref().unwrap_or_default());

            let notes = notes.view();
            if notes.is_empty() {
                println!("No notes yet.");
            }
            for note in notes {
                println!(
                    "#{:<5} {}  {}",
                    note.id,
                    format_timestamp(note.created_at, &config.timezone),
                    note.content
                );
            }
        }
        Command::AddNote { content } => {
            let notes = NotesViewModel::new(api);
            report_mutation(notes.create(identity, NoteDraft::new(&content)).await?);
        }
        Command::DeleteNote { id } => {
            let notes = NotesViewModel::new(api);
            delete_with_confirmation(&notes, identity, id, "note").await?;
        }
        Command::SetBalance { balance } => {
            let profile = ProfileViewModel::new(api);
            let message = profile.update_balance(identity, &balance).await?;
            print_alert(&Alert::success("Success", &message));
        }
    }

    Ok(())
}

fn default_session_file() -> PathBuf {
    if let Ok(path) = env::var("TCASH_SESSION_FILE") {
        return PathBuf::from(path);
    }

    match env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(DEFAULT_SESSION_FILE),
        None => PathBuf::from(DEFAULT_SESSION_FILE),
    }
}

/// A deferred load means there was no identity to load for.
fn require_identity(outcome: LoadOutcome) -> Result<(), Error> {
    match outcome {
        LoadOutcome::Deferred => Err(Error::AuthNotReady),
        _ => Ok(()),
    }
}

async fn delete_with_confirmation<S: ListSource>(
    view_model: &RemoteListViewModel<S>,
    identity: Option<&Identity>,
    id: RecordId,
    noun: &str,
) -> Result<(), Error> {
    if identity.is_none() {
        return Err(Error::AuthNotReady);
    }

    let pending = view_model.request_delete(id);

    if !confirm(&format!(
        "Are you sure you want to delete this {noun} (#{id})?"
    )) {
        view_model.cancel_delete();
        println!("Cancelled.");
        return Ok(());
    }

    report_mutation(view_model.confirm_delete(identity, pending).await?);
    Ok(())
}

fn confirm(question: &str) -> bool {
    print!("{question} [y/N] ");
    if let Err(error) = io::stdout().flush() {
        tracing::error!("Could not flush stdout: {error}");
    }

    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(error) => {
            print_error(format!("Could not read answer from stdin: {error}"));
            false
        }
    }
}

fn report_mutation(outcome: MutationOutcome) {
    print_alert(&outcome.alert);

    if let Err(error) = outcome.refresh {
        tracing::error!("Could not refresh after the change: {error}");
        print_error("The change was saved, but the list could not be refreshed.");
    }
}

fn print_transactions(transactions: &[Transaction], timezone: &str) {
    if transactions.is_empty() {
        println!("No transactions yet.");
        return;
    }

    for transaction in transactions {
        println!(
            "#{:<5} {}  {:<8} {:<20} {:>14}",
            transaction.id,
            format_timestamp(transaction.created_at, timezone),
            transaction.kind.to_string(),
            transaction.ref_number,
            format_transaction_amount(transaction.kind, transaction.amount)
        );
    }
}

fn print_alert(alert: &Alert) {
    match alert.alert_type {
        AlertType::Success => println!("\x1b[32;1m{alert}\x1b[0m"),
        AlertType::Error => eprintln!("\x1b[31;1m{alert}\x1b[0m"),
    }
}

fn print_error(error: impl ToString) {
    print_alert(&Alert::error_simple(&error.to_string()));
}
