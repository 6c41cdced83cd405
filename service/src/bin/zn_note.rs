#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]
#![allow(clippy::print_stdout)]

//! `zn-note`: seal and open note envelopes from the command line.
//!
//! Works on the same envelope JSON the browser produces, so it can be used to
//! inspect or back up notes fetched from the API.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use zn_crypto::{
    verify, DeleteToken, DeleteTokenHash, Envelope, NoteContent, Passphrase, UnlockState,
};

#[derive(Parser)]
#[command(name = "zn-note", version, about = "Encrypt and decrypt ZeroNote envelopes")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encrypt note JSON into an envelope
    Encrypt {
        /// Note JSON file ("-" for stdin)
        input: PathBuf,
        /// Password; omit to seal without one
        #[arg(long, env = "ZN_NOTE_PASSWORD")]
        password: Option<String>,
    },
    /// Decrypt an envelope into note JSON
    Decrypt {
        /// Envelope JSON file ("-" for stdin)
        input: PathBuf,
        /// Password, only needed for password-protected notes
        #[arg(long, env = "ZN_NOTE_PASSWORD")]
        password: Option<String>,
    },
    /// Issue a delete token and print it with its hash
    Token,
    /// Check a delete token against a stored hash
    Verify {
        #[arg(long, env = "ZN_NOTE_TOKEN")]
        token: String,
        #[arg(long)]
        hash: String,
    },
}

fn read_input(path: &PathBuf) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    }
}

/// Parse note JSON, stamp it as saved at `now_ms` and seal it.
fn seal_json(json: &str, password: Option<String>, now_ms: i64) -> anyhow::Result<Envelope> {
    let mut note: NoteContent = serde_json::from_str(json).context("parsing note JSON")?;
    note.mark_saved(now_ms);
    let passphrase = password.map_or_else(Passphrase::unprotected, Passphrase::user);
    zn_crypto::seal_note(&note, &passphrase).map_err(|e| anyhow!("{:?}: {e}", e.user_outcome()))
}

fn encrypt(input: &PathBuf, password: Option<String>) -> anyhow::Result<()> {
    let envelope = seal_json(
        &read_input(input)?,
        password,
        chrono::Utc::now().timestamp_millis(),
    )?;
    println!("{}", envelope.to_json());
    Ok(())
}

fn decrypt(input: &PathBuf, password: Option<String>) -> anyhow::Result<()> {
    let envelope = Envelope::from_json(&read_input(input)?).context("parsing envelope")?;

    let mut state = UnlockState::new(envelope).attempt_sentinel();
    if state.needs_password() {
        let Some(password) = password else {
            bail!("note is password protected; pass --password");
        };
        state = state.attempt_password(Passphrase::user(password));
    }

    match state {
        UnlockState::Unlocked(unlocked) => {
            println!("{}", serde_json::to_string_pretty(&unlocked.content)?);
            Ok(())
        }
        UnlockState::Rejected { outcome, .. } => bail!("cannot open note: {outcome:?}"),
        UnlockState::Locked(_) | UnlockState::PasswordRequired(_) => {
            bail!("cannot open note: wrong password")
        }
    }
}

fn main() -> anyhow::Result<()> {
    match Cli::parse().command {
        Command::Encrypt { input, password } => encrypt(&input, password),
        Command::Decrypt { input, password } => decrypt(&input, password),
        Command::Token => {
            let token = DeleteToken::generate()?;
            println!("token: {}", token.as_str());
            println!("hash:  {}", token.hash());
            Ok(())
        }
        Command::Verify { token, hash } => {
            let stored: DeleteTokenHash = hash.parse()?;
            if verify(Some(&token), &stored) {
                println!("ok");
                Ok(())
            } else {
                bail!("token does not match")
            }
        }
    }
}
